//! Static commit message templates keyed by format and language.

use std::fmt;

/// Commit message conventions the backend can be asked to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitFormat {
    Conventional,
    Angular,
    Karma,
    Semantic,
    Emoji,
}

impl CommitFormat {
    pub const ALL: [CommitFormat; 5] = [
        CommitFormat::Conventional,
        CommitFormat::Angular,
        CommitFormat::Karma,
        CommitFormat::Semantic,
        CommitFormat::Emoji,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitFormat::Conventional => "conventional",
            CommitFormat::Angular => "angular",
            CommitFormat::Karma => "karma",
            CommitFormat::Semantic => "semantic",
            CommitFormat::Emoji => "emoji",
        }
    }

    /// Case-insensitive lookup; `None` for anything unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for CommitFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Languages with dedicated templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    SimplifiedChinese,
    Japanese,
}

impl Language {
    /// Accepts names and common locale codes, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Some(Language::English),
            "zh" | "zh-cn" | "zh-hans" | "chinese" | "简体中文" => Some(Language::SimplifiedChinese),
            "ja" | "ja-jp" | "japanese" | "日本語" => Some(Language::Japanese),
            _ => None,
        }
    }
}

struct Template {
    format: CommitFormat,
    language: Language,
    body: &'static str,
}

/// Used whenever the requested pair has no dedicated template.
pub const DEFAULT_TEMPLATE: &str = CONVENTIONAL_EN;

/// Rules replaced wholesale by the user's own instructions.
pub const CUSTOM_TEMPLATE: &str = "You are generating a Git commit message for the changes below.

Follow these instructions from the user exactly:

{custom_instructions}";

const CONVENTIONAL_EN: &str = "You are generating a Git commit message following the Conventional Commits specification.

## Header
- Format: `<type>(<scope>): <description>`
- Type: one of feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert
- Scope: optional, the module or area affected
- Description: imperative mood, lowercase, no period at the end
- Keep the header at or under 72 characters

## Body
- Optional, separated from the header by a blank line
- Explain what changed and why, wrapped at 72 characters
- Use `BREAKING CHANGE: <description>` in a footer for incompatible changes";

const ANGULAR_EN: &str = "You are generating a Git commit message following the Angular commit message convention.

## Header
- Format: `<type>(<scope>): <short summary>`
- Type: one of build, ci, docs, feat, fix, perf, refactor, test
- Scope: the name of the affected package or component
- Summary: present tense, imperative, not capitalized, no period at the end
- The header must not exceed 100 characters

## Body
- Mandatory for every type except docs; at least 20 characters
- Explain the motivation for the change and contrast it with previous behavior

## Footer
- `BREAKING CHANGE: <summary>` followed by migration notes, or `Closes #<issue>`";

const KARMA_EN: &str = "You are generating a Git commit message following the Karma commit convention.

## Subject
- Format: `<type>(<scope>): <subject>`
- Type: one of feat, fix, docs, style, refactor, perf, test, chore
- Scope: where the change happened, e.g. a file or module name
- Subject: imperative, present tense, no capital first letter, no period
- Keep the subject line under 70 characters

## Body
- Imperative, present tense, explaining the motivation for the change
- Wrap lines at 80 characters

## Footer
- Reference issues (`Closes #123`) and describe breaking changes";

const SEMANTIC_EN: &str = "You are generating a Git commit message following the Semantic commit convention.

## Header
- Format: `<type>: <subject>`
- Type: one of feat, fix, docs, style, refactor, perf, test, chore
- Subject: imperative, present tense, lowercase, no period at the end
- Keep the header under 50 characters

## Body
- Optional; describe what changed and why in at most 3 short lines";

const EMOJI_EN: &str = "You are generating a Git commit message that starts with a gitmoji.

## Header
- Format: `<emoji> <type>: <description>`
- Emoji and type pairs:
  - ✨ feat: a new feature
  - 🐛 fix: a bug fix
  - 📝 docs: documentation only
  - 💄 style: formatting, no code change
  - ♻️ refactor: code change that neither fixes a bug nor adds a feature
  - ⚡️ perf: performance improvement
  - ✅ test: adding or fixing tests
  - 🔧 chore: tooling, configuration, maintenance
  - 👷 ci: continuous integration
  - 📦 build: build system or dependencies
- Description: imperative mood, lowercase, no period at the end
- Keep the header at or under 72 characters

## Body
- Optional, separated by a blank line, explaining why the change was made";

const CONVENTIONAL_ZH: &str = "你正在根据 Conventional Commits 规范生成 Git 提交信息。

## 标题
- 格式：`<type>(<scope>): <description>`
- type 必须是以下之一：feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert
- scope 可选，表示受影响的模块
- description 使用简体中文，简洁明了，结尾不加句号
- 标题不超过 72 个字符

## 正文
- 可选，与标题之间空一行
- 使用简体中文说明修改了什么以及为什么修改";

const EMOJI_ZH: &str = "你正在生成以 gitmoji 开头的 Git 提交信息。

## 标题
- 格式：`<emoji> <type>: <description>`
- 常用组合：✨ feat 新功能，🐛 fix 修复缺陷，📝 docs 文档，💄 style 格式，♻️ refactor 重构，⚡️ perf 性能，✅ test 测试，🔧 chore 杂项，👷 ci 持续集成，📦 build 构建
- description 使用简体中文，结尾不加句号
- 标题不超过 72 个字符

## 正文
- 可选，与标题之间空一行，使用简体中文说明修改原因";

const CONVENTIONAL_JA: &str = "Conventional Commits 仕様に従って Git のコミットメッセージを作成してください。

## ヘッダー
- 形式：`<type>(<scope>): <description>`
- type は次のいずれか：feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert
- scope は任意で、影響を受けるモジュールを示します
- description は日本語で簡潔に書き、末尾に句点を付けません
- ヘッダーは 72 文字以内にしてください

## 本文
- 任意。ヘッダーとの間に空行を入れ、変更内容と理由を日本語で説明してください";

const TEMPLATES: &[Template] = &[
    Template { format: CommitFormat::Conventional, language: Language::English, body: CONVENTIONAL_EN },
    Template { format: CommitFormat::Angular, language: Language::English, body: ANGULAR_EN },
    Template { format: CommitFormat::Karma, language: Language::English, body: KARMA_EN },
    Template { format: CommitFormat::Semantic, language: Language::English, body: SEMANTIC_EN },
    Template { format: CommitFormat::Emoji, language: Language::English, body: EMOJI_EN },
    Template { format: CommitFormat::Conventional, language: Language::SimplifiedChinese, body: CONVENTIONAL_ZH },
    Template { format: CommitFormat::Emoji, language: Language::SimplifiedChinese, body: EMOJI_ZH },
    Template { format: CommitFormat::Conventional, language: Language::Japanese, body: CONVENTIONAL_JA },
];

/// Look up the rules for `(format, language)`.
///
/// Unknown names and unsupported pairs fall back to [`DEFAULT_TEMPLATE`].
pub fn select_template(format: &str, language: &str) -> &'static str {
    let (Some(format), Some(language)) = (CommitFormat::parse(format), Language::parse(language)) else {
        return DEFAULT_TEMPLATE;
    };

    TEMPLATES
        .iter()
        .find(|t| t.format == format && t.language == language)
        .map(|t| t.body)
        .unwrap_or(DEFAULT_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_has_english_template() {
        for format in CommitFormat::ALL {
            let body = select_template(format.as_str(), "en");
            assert!(
                TEMPLATES.iter().any(|t| t.format == format && t.body == body),
                "missing english template for {format}"
            );
        }
    }

    #[test]
    fn test_format_lookup_is_case_insensitive() {
        assert_eq!(select_template("Angular", "English"), ANGULAR_EN);
        assert_eq!(select_template("EMOJI", "EN"), EMOJI_EN);
    }

    #[test]
    fn test_unsupported_pair_falls_back_verbatim() {
        assert_eq!(select_template("karma", "ja"), DEFAULT_TEMPLATE);
        assert_eq!(select_template("semantic", "zh-CN"), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_unknown_names_fall_back_verbatim() {
        assert_eq!(select_template("gitflow", "en"), DEFAULT_TEMPLATE);
        assert_eq!(select_template("conventional", "klingon"), DEFAULT_TEMPLATE);
        assert_eq!(select_template("", ""), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_localized_templates() {
        assert_eq!(select_template("conventional", "zh-cn"), CONVENTIONAL_ZH);
        assert_eq!(select_template("emoji", "简体中文"), EMOJI_ZH);
        assert_eq!(select_template("conventional", "Japanese"), CONVENTIONAL_JA);
    }

    #[test]
    fn test_default_is_conventional_english() {
        assert_eq!(DEFAULT_TEMPLATE, CONVENTIONAL_EN);
        assert!(DEFAULT_TEMPLATE.contains("Conventional Commits"));
    }

    #[test]
    fn test_templates_carry_type_vocabulary() {
        assert!(CONVENTIONAL_EN.contains("feat, fix, docs"));
        assert!(ANGULAR_EN.contains("100 characters"));
        assert!(SEMANTIC_EN.contains("50 characters"));
        assert!(EMOJI_EN.contains("✨ feat"));
    }

    #[test]
    fn test_custom_template_has_placeholder() {
        assert!(CUSTOM_TEMPLATE.contains("{custom_instructions}"));
    }
}

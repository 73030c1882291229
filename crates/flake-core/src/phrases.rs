//! Localised issue text and annotations
//!
//! Templates use `{name}` placeholders filled by [`fill`]. Braces that do not
//! name a supplied value (Jira markup such as `{code}`) are kept verbatim.
//!
//! Placeholders:
//! - summary: `project_name`, `test_name`, `priority`
//! - description, comment: `test_name`, `test_file`, `priority`, `traceback`,
//!   `separator`, `error`, `job_link`
//! - annotations: `server`, `issue_link`, `pattern`, `operation`

use serde::{Deserialize, Serialize};

/// Separator between the rendered context and the error line
pub const SEPARATOR_WIDTH: usize = 80;

/// Reporting language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Russian
    Ru,
}

impl Language {
    /// Phrase set for this language
    #[must_use]
    pub fn phrases(self) -> &'static ReportingPhrases {
        match self {
            Self::En => &EN_PHRASES,
            Self::Ru => &RU_PHRASES,
        }
    }
}

/// Templates for everything the triage writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPhrases {
    /// New issue summary
    pub summary: &'static str,
    /// New issue description
    pub description: &'static str,
    /// Comment on an existing issue
    pub comment: &'static str,
    /// Annotation: failure matched an exception pattern
    pub filtered: &'static str,
    /// Annotation: tracker unreachable while searching
    pub search_unavailable: &'static str,
    /// Annotation: tracker unreachable while commenting
    pub comment_unavailable: &'static str,
    /// Annotation: tracker unreachable while creating
    pub create_unavailable: &'static str,
    /// Annotation: commented on an existing issue
    pub commented: &'static str,
    /// Annotation: created a new issue
    pub created: &'static str,
    /// Annotation: tracker refused the credentials
    pub unauthorized: &'static str,
}

/// English phrases
pub const EN_PHRASES: ReportingPhrases = ReportingPhrases {
    summary: "[{project_name}] Flaky test {test_name} ({priority})",
    description: "h2. {color:#172b4d}Context{color}
Flaky test
{code}
{test_name}
{code}
Test file - {test_file}
Test priority - {priority}
{code:python}
{traceback}
{separator}
{error}
{code}
Job - {job_link}
h2. {color:#172b4d}What to do{color}
{task}Skip the failing step with the flaky-steps plugin{task}
{task}Find the cause of the failure and fix the test if needed{task}",
    comment: "Repeated flake
Test file - {test_file}
Test priority - {priority}
{job_link}
{code:python}
{traceback}
{separator}
{error}
{code}",
    filtered: "No flaky issue will be reported: the failure matches exception pattern {pattern}",
    search_unavailable: "{server} was unavailable while searching for issues. Skipping issue reporting for this test",
    comment_unavailable: "{server} was unavailable while adding a comment about the flaky test. Skipping the comment for this test",
    create_unavailable: "{server} was unavailable while creating a flaky test issue. Skipping issue creation for this test",
    commented: "Flaky issue already exists {issue_link}",
    created: "New flaky issue created {issue_link}",
    unauthorized: "{server} rejected the configured credentials during {operation}. No flaky issue was reported",
};

/// Russian phrases
pub const RU_PHRASES: ReportingPhrases = ReportingPhrases {
    summary: "[{project_name}] Флаки тест {test_name} ({priority})",
    description: "h2. {color:#172b4d}Контекст{color}
Флаки тест
{code}
{test_name}
{code}
Файл теста - {test_file}
Приоритет теста - {priority}
{code:python}
{traceback}
{separator}
{error}
{code}
Джоба - {job_link}
h2. {color:#172b4d}Что нужно сделать{color}
{task}Заскипать место падения плагином flaky-steps{task}
{task}Разобраться в причине падения и починить тест по необходимости{task}",
    comment: "Повторный флак
Файл теста - {test_file}
Приоритет теста - {priority}
{job_link}
{code:python}
{traceback}
{separator}
{error}
{code}",
    filtered: "Флаки тикета не будет. Падение отфильтровано по шаблону исключений {pattern}",
    search_unavailable: "{server} не был доступен во время поиска тикетов. Пропускаем создание тикета для текущего теста",
    comment_unavailable: "{server} не был доступен во время добавления комментария о флакующем тесте. Пропускаем создание комментария для текущего теста",
    create_unavailable: "{server} не был доступен во время создания тикета на флаки тест. Пропускаем создание тикета для текущего теста",
    commented: "Флаки тикет уже есть {issue_link}",
    created: "Заведен новый флаки тикет {issue_link}",
    unauthorized: "{server} отклонил учетные данные во время {operation}. Флаки тикет не заведен",
};

/// Separator line placed between context and error
#[must_use]
pub fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Substitute `{name}` placeholders in a single pass
///
/// Substituted values are never rescanned, so a traceback containing
/// `{priority}` is left alone.
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let value = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Task search predicates
///
/// A search request carries up to four optional criteria: assignee, status
/// slug, label and a title substring. [`TaskSpecification::build`] turns that
/// bag into one [`TaskPredicate`], the conjunction of every supplied
/// criterion. Missing criteria contribute nothing, so an empty filter matches
/// every task.
///
/// The predicate is a small tree that can be evaluated in two ways:
///
/// - in memory against a hydrated [`Task`] (`matches`)
/// - as a parameterized SQL condition appended to a `sqlx::QueryBuilder`
///   (`push_sql`), aliasing the tasks table as `t` and the statuses table as `s`
///
/// Both renderings follow the same rules. Status comparison is exact and
/// case-sensitive; title matching is a case-insensitive substring test; the
/// label test is an existence check, so a task never appears twice.
///
/// # Example
///
/// ```
/// use taskboard_shared::filter::{TaskFilter, TaskPredicate, TaskSpecification};
///
/// let filter = TaskFilter {
///     status: Some("draft".to_string()),
///     title_cont: Some("Rev".to_string()),
///     ..Default::default()
/// };
///
/// let predicate = TaskSpecification::build(&filter);
/// assert_eq!(
///     predicate,
///     TaskPredicate::StatusIs("draft".to_string()).and(TaskPredicate::TitleContains("rev".to_string())),
/// );
///
/// assert_eq!(TaskSpecification::build(&TaskFilter::default()), TaskPredicate::Always);
/// ```

use crate::models::task::Task;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

/// Optional task search criteria, as sent in the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    /// Tasks assigned to this user
    pub assignee_id: Option<i64>,

    /// Tasks in the status with this slug
    pub status: Option<String>,

    /// Tasks carrying this label
    pub label_id: Option<i64>,

    /// Tasks whose title contains this text, ignoring case
    pub title_cont: Option<String>,
}

/// A boolean test over items of type `T`
pub trait Predicate<T> {
    fn test(&self, item: &T) -> bool;
}

/// Composable test over tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPredicate {
    /// Identity, matches every task
    Always,

    AssigneeIs(i64),

    /// Exact slug match
    StatusIs(String),

    HasLabel(i64),

    /// Holds the needle already lower-cased
    TitleContains(String),

    And(Box<TaskPredicate>, Box<TaskPredicate>),
}

impl TaskPredicate {
    /// Case-insensitive title substring test
    pub fn title_contains(needle: &str) -> Self {
        TaskPredicate::TitleContains(needle.to_lowercase())
    }

    /// Conjunction; `Always` is absorbed
    pub fn and(self, other: TaskPredicate) -> TaskPredicate {
        match (self, other) {
            (TaskPredicate::Always, p) | (p, TaskPredicate::Always) => p,
            (a, b) => TaskPredicate::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, TaskPredicate::Always)
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskPredicate::Always => true,
            TaskPredicate::AssigneeIs(id) => task.assignee_id == Some(*id),
            TaskPredicate::StatusIs(slug) => task.status.slug == *slug,
            TaskPredicate::HasLabel(id) => task.has_label(*id),
            TaskPredicate::TitleContains(needle) => task.title.to_lowercase().contains(needle.as_str()),
            TaskPredicate::And(a, b) => a.matches(task) && b.matches(task),
        }
    }

    /// Appends this predicate as a SQL boolean expression
    ///
    /// Expects the query to select from `tasks t JOIN task_statuses s`.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            TaskPredicate::Always => {
                qb.push("TRUE");
            }
            TaskPredicate::AssigneeIs(id) => {
                qb.push("t.assignee_id = ").push_bind(*id);
            }
            TaskPredicate::StatusIs(slug) => {
                qb.push("s.slug = ").push_bind(slug.clone());
            }
            TaskPredicate::HasLabel(id) => {
                qb.push("EXISTS (SELECT 1 FROM task_labels tl WHERE tl.task_id = t.id AND tl.label_id = ")
                    .push_bind(*id)
                    .push(")");
            }
            TaskPredicate::TitleContains(needle) => {
                qb.push("strpos(lower(t.title), lower(")
                    .push_bind(needle.clone())
                    .push(")) > 0");
            }
            TaskPredicate::And(a, b) => {
                qb.push("(");
                a.push_sql(qb);
                qb.push(" AND ");
                b.push_sql(qb);
                qb.push(")");
            }
        }
    }
}

impl Predicate<Task> for TaskPredicate {
    fn test(&self, item: &Task) -> bool {
        self.matches(item)
    }
}

/// Builds task predicates from search criteria
pub struct TaskSpecification;

impl TaskSpecification {
    pub fn build(filter: &TaskFilter) -> TaskPredicate {
        Self::with_assignee(filter.assignee_id)
            .and(Self::with_status(filter.status.as_deref()))
            .and(Self::with_label(filter.label_id))
            .and(Self::with_title(filter.title_cont.as_deref()))
    }

    fn with_assignee(assignee_id: Option<i64>) -> TaskPredicate {
        assignee_id.map_or(TaskPredicate::Always, TaskPredicate::AssigneeIs)
    }

    fn with_status(slug: Option<&str>) -> TaskPredicate {
        slug.map_or(TaskPredicate::Always, |slug| TaskPredicate::StatusIs(slug.to_string()))
    }

    fn with_label(label_id: Option<i64>) -> TaskPredicate {
        label_id.map_or(TaskPredicate::Always, TaskPredicate::HasLabel)
    }

    fn with_title(needle: Option<&str>) -> TaskPredicate {
        needle.map_or(TaskPredicate::Always, TaskPredicate::title_contains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::Label;
    use crate::models::task_status::TaskStatus;
    use chrono::Utc;

    fn task(title: &str, slug: &str, assignee_id: Option<i64>, label_ids: &[i64]) -> Task {
        Task {
            id: 1,
            title: title.to_string(),
            description: None,
            index: None,
            assignee_id,
            status: TaskStatus {
                id: 1,
                name: slug.to_string(),
                slug: slug.to_string(),
                created_at: Utc::now(),
            },
            labels: label_ids
                .iter()
                .map(|id| Label {
                    id: *id,
                    name: format!("label-{id}"),
                    created_at: Utc::now(),
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let predicate = TaskSpecification::build(&TaskFilter::default());
        assert!(predicate.is_always());
        assert!(predicate.matches(&task("anything", "draft", None, &[])));
    }

    #[test]
    fn test_title_is_case_insensitive_substring() {
        let predicate = TaskPredicate::title_contains("rev");
        assert!(predicate.matches(&task("Review PR", "draft", None, &[])));
        assert!(predicate.matches(&task("PREVIEW", "draft", None, &[])));
        assert!(!predicate.matches(&task("Write docs", "draft", None, &[])));
    }

    #[test]
    fn test_status_is_exact() {
        let predicate = TaskPredicate::StatusIs("draft".to_string());
        assert!(predicate.matches(&task("t", "draft", None, &[])));
        assert!(!predicate.matches(&task("t", "Draft", None, &[])));
        assert!(!predicate.matches(&task("t", "draft_2", None, &[])));
    }

    #[test]
    fn test_assignee_and_label() {
        let t = task("t", "draft", Some(4), &[1, 2]);
        assert!(TaskPredicate::AssigneeIs(4).matches(&t));
        assert!(!TaskPredicate::AssigneeIs(5).matches(&t));
        assert!(TaskPredicate::HasLabel(2).matches(&t));
        assert!(!TaskPredicate::HasLabel(3).matches(&t));
        assert!(!TaskPredicate::AssigneeIs(4).matches(&task("t", "draft", None, &[])));
    }

    #[test]
    fn test_conjunction() {
        let filter = TaskFilter {
            assignee_id: Some(4),
            label_id: Some(2),
            ..Default::default()
        };
        let predicate = TaskSpecification::build(&filter);
        assert!(predicate.matches(&task("t", "draft", Some(4), &[2])));
        assert!(!predicate.matches(&task("t", "draft", Some(4), &[1])));
        assert!(!predicate.matches(&task("t", "draft", Some(3), &[2])));
        assert!(predicate.test(&task("t", "done", Some(4), &[1, 2])));
    }

    #[test]
    fn test_and_absorbs_always() {
        let p = TaskPredicate::Always.and(TaskPredicate::HasLabel(1));
        assert_eq!(p, TaskPredicate::HasLabel(1));
        let p = TaskPredicate::HasLabel(1).and(TaskPredicate::Always);
        assert_eq!(p, TaskPredicate::HasLabel(1));
    }

    #[test]
    fn test_push_sql_identity() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT t.id FROM tasks t WHERE ");
        TaskPredicate::Always.push_sql(&mut qb);
        assert_eq!(qb.sql(), "SELECT t.id FROM tasks t WHERE TRUE");
    }

    #[test]
    fn test_push_sql_conjunction() {
        let filter = TaskFilter {
            assignee_id: Some(1),
            status: Some("draft".to_string()),
            label_id: Some(3),
            title_cont: Some("Fix".to_string()),
        };
        let mut qb = QueryBuilder::<Postgres>::new("");
        TaskSpecification::build(&filter).push_sql(&mut qb);
        assert_eq!(
            qb.sql(),
            "(((t.assignee_id = $1 AND s.slug = $2) AND EXISTS (SELECT 1 FROM task_labels tl \
             WHERE tl.task_id = t.id AND tl.label_id = $3)) AND strpos(lower(t.title), lower($4)) > 0)"
        );
    }

    #[test]
    fn test_filter_query_names() {
        let filter: TaskFilter =
            serde_json::from_str(r#"{"assigneeId": 2, "labelId": 5, "titleCont": "x"}"#).unwrap();
        assert_eq!(filter.assignee_id, Some(2));
        assert_eq!(filter.label_id, Some(5));
        assert_eq!(filter.title_cont.as_deref(), Some("x"));
        assert_eq!(filter.status, None);
    }
}

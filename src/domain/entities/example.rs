//! Example entity, the sample resource every CRUD route operates on.

use chrono::{DateTime, Utc};

/// Identity allowed to mutate any record regardless of ownership.
pub const ADMIN_IDENTITY: &str = "admin";

/// Owner stamped on rows created by the bootstrap seed.
pub const SYSTEM_IDENTITY: &str = "system";

pub const STATUS_DISABLED: i32 = 0;
pub const STATUS_ENABLED: i32 = 1;

/// A stored example record.
///
/// Rows are never physically removed: a set `deleted_at` hides the record
/// from every scoped query while keeping its id reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: i32,
    pub sort_order: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Example {
    /// Returns true if the record has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if `actor` owns the record or is the admin identity.
    pub fn can_be_modified_by(&self, actor: &str) -> bool {
        self.created_by == actor || actor == ADMIN_IDENTITY
    }
}

/// Input data for creating a new example.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExample {
    pub title: String,
    pub description: String,
    pub status: i32,
    pub sort_order: i32,
    pub created_by: String,
}

impl NewExample {
    /// Builds a draft with the default status and sort order.
    pub fn new(title: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: STATUS_ENABLED,
            sort_order: 0,
            created_by: created_by.into(),
        }
    }
}

/// Partial update for an existing example.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExamplePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<i32>,
    pub sort_order: Option<i32>,
}

impl ExamplePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.sort_order.is_none()
    }

    /// Writes the present fields onto `example` and bumps `updated_at`.
    pub fn apply_to(&self, example: &mut Example, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            example.title = title.clone();
        }
        if let Some(description) = &self.description {
            example.description = description.clone();
        }
        if let Some(status) = self.status {
            example.status = status;
        }
        if let Some(sort_order) = self.sort_order {
            example.sort_order = sort_order;
        }
        example.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_example(created_by: &str) -> Example {
        let now = Utc::now();
        Example {
            id: 7,
            title: "First".to_string(),
            description: String::new(),
            status: STATUS_ENABLED,
            sort_order: 0,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_owner_and_admin_can_modify() {
        let example = make_example("u1");
        assert!(example.can_be_modified_by("u1"));
        assert!(example.can_be_modified_by(ADMIN_IDENTITY));
        assert!(!example.can_be_modified_by("u2"));
        assert!(!example.can_be_modified_by(""));
    }

    #[test]
    fn test_is_deleted() {
        let mut example = make_example("u1");
        assert!(!example.is_deleted());
        example.deleted_at = Some(Utc::now());
        assert!(example.is_deleted());
    }

    #[test]
    fn test_new_example_defaults() {
        let draft = NewExample::new("Title", "u1");
        assert_eq!(draft.status, STATUS_ENABLED);
        assert_eq!(draft.sort_order, 0);
        assert!(draft.description.is_empty());
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut example = make_example("u1");
        let before = example.clone();
        let later = before.updated_at + chrono::Duration::seconds(5);

        let patch = ExamplePatch {
            status: Some(STATUS_DISABLED),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to(&mut example, later);

        assert_eq!(example.status, STATUS_DISABLED);
        assert_eq!(example.title, before.title);
        assert_eq!(example.sort_order, before.sort_order);
        assert_eq!(example.created_at, before.created_at);
        assert_eq!(example.updated_at, later);
    }

    #[test]
    fn test_default_patch_is_empty() {
        assert!(ExamplePatch::default().is_empty());
    }
}

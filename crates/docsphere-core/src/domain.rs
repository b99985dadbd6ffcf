//! Core data model for the synchronization layer.
//!
//! Field names follow the remote store's wire format so these types
//! serialize directly in requests and responses without mapping
//! layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── roles and capabilities ───────────────────────────────────────────

/// Account role assigned by the platform. Closed set; the remote store
/// only ever reports these two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    /// Map the role onto its capability set. Checked once at the sync
    /// engine boundary rather than scattered through callers.
    pub fn capabilities(self) -> Capabilities {
        match self {
            Role::Teacher => Capabilities {
                can_edit: true,
                can_view: true,
            },
            Role::Student => Capabilities {
                can_edit: false,
                can_view: true,
            },
        }
    }
}

/// What the acting user is permitted to do with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// May mutate title and body (teachers, invited editors).
    pub can_edit: bool,
    /// May read and download.
    pub can_view: bool,
}

impl Capabilities {
    /// The capability set for anonymous or token-only sessions, where
    /// no role is known.
    pub fn view_only() -> Self {
        Self {
            can_edit: false,
            can_view: true,
        }
    }
}

// ── users ────────────────────────────────────────────────────────────

/// Immutable profile snapshot as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl User {
    /// "First Last", used for display and log context.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A local-only partial update merged into the cached profile.
/// All fields optional; absent fields leave the snapshot untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserPatch {
    /// Apply the patch to a profile snapshot in place.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(avatar_url) = &self.avatar_url {
            user.avatar_url = Some(avatar_url.clone());
        }
    }
}

/// Credentials for login and signup. Signup additionally carries the
/// name and requested role; the optional fields are omitted from the
/// wire payload when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Credentials {
    /// Login-shaped credentials (email + password only).
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: None,
            last_name: None,
            role: None,
        }
    }
}

// ── documents ────────────────────────────────────────────────────────

/// Permission level granted to a collaborator on one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorRole {
    Viewer,
    Editor,
}

/// A granted permission: one user, one role. The editor set of a
/// document is unique by `user.id` and ordered by invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEditor {
    pub user: User,
    pub role: EditorRole,
}

/// A document held by the editing session. `id == None` is the
/// sentinel for a new document that has never been persisted and
/// therefore requires no load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub editors: Vec<DocumentEditor>,
}

impl Document {
    /// A new, unsaved document. Starts with no identity and no
    /// collaborators.
    pub fn draft(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: String::new(),
            updated_at: None,
            editors: Vec::new(),
        }
    }

    /// Merge a batch of grants into the editor set: unique by user id,
    /// last write wins on role, insertion order preserved for new
    /// entries.
    pub fn merge_editors(&mut self, grants: impl IntoIterator<Item = DocumentEditor>) {
        for grant in grants {
            match self
                .editors
                .iter_mut()
                .find(|e| e.user.id == grant.user.id)
            {
                Some(existing) => *existing = grant,
                None => self.editors.push(grant),
            }
        }
    }

    /// Ids of every user holding a grant, in invitation order.
    pub fn editor_ids(&self) -> Vec<i64> {
        self.editors.iter().map(|e| e.user.id).collect()
    }
}

// ── analytics ────────────────────────────────────────────────────────

/// View counters reported per document. Unknown counters are ignored
/// on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub unique_views: u64,
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            first_name: format!("u{id}"),
            last_name: "test".into(),
            email: format!("u{id}@example.com"),
            avatar_url: None,
            role,
        }
    }

    #[test]
    fn teacher_can_edit_student_cannot() {
        assert!(Role::Teacher.capabilities().can_edit);
        assert!(!Role::Student.capabilities().can_edit);
        assert!(Role::Student.capabilities().can_view);
    }

    #[test]
    fn merge_editors_dedupes_by_user_id_last_role_wins() {
        let mut doc = Document::draft("notes");
        doc.merge_editors([DocumentEditor {
            user: user(1, Role::Student),
            role: EditorRole::Viewer,
        }]);
        doc.merge_editors([
            DocumentEditor {
                user: user(2, Role::Student),
                role: EditorRole::Viewer,
            },
            DocumentEditor {
                user: user(1, Role::Student),
                role: EditorRole::Editor,
            },
        ]);

        assert_eq!(doc.editors.len(), 2);
        assert_eq!(doc.editors[0].user.id, 1);
        assert_eq!(doc.editors[0].role, EditorRole::Editor);
        assert_eq!(doc.editors[1].user.id, 2);
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut u = user(1, Role::Teacher);
        UserPatch {
            first_name: Some("Ada".into()),
            ..UserPatch::default()
        }
        .apply_to(&mut u);
        assert_eq!(u.first_name, "Ada");
        assert_eq!(u.last_name, "test");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
        assert_eq!(
            serde_json::to_string(&EditorRole::Viewer).unwrap(),
            "\"viewer\""
        );
    }
}

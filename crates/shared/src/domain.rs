use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);

/// A user record as held by the remote directory service.
///
/// The wire representation uses `nama` for the full name; in memory the
/// field is `full_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    #[serde(rename = "nama")]
    pub full_name: String,
    pub email: String,
}

impl UserRecord {
    /// Case-insensitive substring match against username or full name.
    ///
    /// An empty query matches every record.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.username.to_lowercase().contains(&query)
            || self.full_name.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: UserId(1),
            username: "alice".into(),
            full_name: "Alice A".into(),
            email: "alice@example.com".into(),
        }
    }

    #[test]
    fn wire_field_for_full_name_is_nama() {
        let json = serde_json::to_string(&record()).expect("serialize");
        assert!(json.contains("\"nama\":\"Alice A\""));
        assert!(!json.contains("full_name"));

        let parsed: UserRecord =
            serde_json::from_str(r#"{"id":2,"username":"bob","nama":"Bob B","email":"b@b.co"}"#)
                .expect("deserialize");
        assert_eq!(parsed.full_name, "Bob B");
    }

    #[test]
    fn query_matching_is_case_insensitive_on_both_fields() {
        let record = record();
        assert!(record.matches_query(""));
        assert!(record.matches_query("ali"));
        assert!(record.matches_query("ALICE"));
        assert!(record.matches_query("ce a"));
        assert!(!record.matches_query("zz"));
    }
}

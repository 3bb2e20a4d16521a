use serde::{Deserialize, Serialize};

use crate::domain::UserRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub user: UserRecord,
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(rename = "nama")]
    pub full_name: String,
}

/// Body of `PUT /users/{id}`. The id travels in the path, never in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    #[serde(rename = "nama")]
    pub full_name: String,
    pub email: String,
}

/// Failure body of the login endpoint (`{"msg": ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFailureBody {
    #[serde(default)]
    pub msg: Option<String>,
}

/// Failure body of every other endpoint (`{"message": ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn login_success_round_trips_the_documented_shape() {
        let raw = r#"{
            "user": {"id": 7, "username": "alice", "nama": "Alice A", "email": "a@a.co"},
            "access_token": "tok-123"
        }"#;
        let success: LoginSuccess = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(success.user.id, UserId(7));
        assert_eq!(success.access_token, "tok-123");
    }

    #[test]
    fn update_request_uses_nama_on_the_wire() {
        let request = UpdateUserRequest {
            username: "bob".into(),
            full_name: "Bob B".into(),
            email: "b@b.co".into(),
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(json.contains("\"nama\":\"Bob B\""));
    }

    #[test]
    fn failure_bodies_tolerate_missing_fields() {
        let login: LoginFailureBody = serde_json::from_str("{}").expect("deserialize");
        assert!(login.msg.is_none());
        let message: MessageBody = serde_json::from_str("{}").expect("deserialize");
        assert!(message.message.is_none());
    }
}

use serde::{Deserialize, Serialize};

/// Email shown for a session restored from a stored token, before the
/// real profile has been fetched.
pub const PLACEHOLDER_EMAIL: &str = "user@example.com";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: String,
}

/// Response of `GET /user/authdata`
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub success: bool,
    pub query: UserQuery,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub member_status: Option<String>,
    #[serde(default)]
    pub last_login_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The signed-in member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct User {
    pub email: String,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub age: u32,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "wechatId")]
    pub wechat_id: String,
    #[serde(rename = "profilePicture", default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub created_at: String,
}

impl User {
    /// Build a user from the profile query. The backend does not return
    /// age, phone, messaging id or avatar yet, so those stay empty.
    pub fn from_profile(query: &UserQuery) -> Self {
        Self {
            email: query.email.clone(),
            username: query.username.clone().unwrap_or_default(),
            full_name: query.first_name.clone().unwrap_or_default(),
            age: 0,
            phone_number: String::new(),
            wechat_id: String::new(),
            profile_picture: None,
            created_at: query.created_at.clone().unwrap_or_default(),
        }
    }

    /// Minimal user synthesized when a session is restored from storage.
    pub fn placeholder() -> Self {
        Self {
            email: PLACEHOLDER_EMAIL.to_string(),
            username: String::new(),
            full_name: String::new(),
            age: 0,
            phone_number: String::new(),
            wechat_id: String::new(),
            profile_picture: None,
            created_at: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.email == PLACEHOLDER_EMAIL && self.username.is_empty()
    }

    /// Name for greetings, falling back to username then email.
    pub fn display_name(&self) -> &str {
        if !self.full_name.is_empty() {
            &self.full_name
        } else if !self.username.is_empty() {
            &self.username
        } else {
            &self.email
        }
    }
}

/// Body of `PUT /user/profile`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub age: u32,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "wechatId")]
    pub wechat_id: String,
}

/// Password change form. `confirm_password` is checked locally and never sent.
#[derive(Debug, Clone, Default)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordChangeBody<'a> {
    #[serde(rename = "currentPassword")]
    pub current_password: &'a str,
    #[serde(rename = "newPassword")]
    pub new_password: &'a str,
}

impl PasswordChange {
    /// Presence and confirmation checks, mirroring the profile form.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err("Password is empty!");
        }
        if self.new_password != self.confirm_password {
            return Err("New passwords do not match");
        }
        Ok(())
    }

    pub(crate) fn body(&self) -> PasswordChangeBody<'_> {
        PasswordChangeBody {
            current_password: &self.current_password,
            new_password: &self.new_password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_profile() {
        let json = r#"{"success":true,"query":{"email":"u@x.com","username":"u","first_name":"U","last_name":"X","created_at":"2025-01-01T00:00:00Z","stripe_customer_id":"cus_1"}}"#;
        let resp: UserResponse = serde_json::from_str(json).unwrap();
        let user = User::from_profile(&resp.query);

        assert_eq!(user.email, "u@x.com");
        assert_eq!(user.username, "u");
        assert_eq!(user.full_name, "U");
        assert_eq!(user.age, 0);
        assert!(user.phone_number.is_empty());
        assert_eq!(user.created_at, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_login_response_without_token() {
        let resp: LoginResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.token.is_empty());
    }

    #[test]
    fn test_placeholder_user() {
        let user = User::placeholder();
        assert!(user.is_placeholder());
        assert_eq!(user.display_name(), PLACEHOLDER_EMAIL);
        assert!(user.created_at.is_empty());
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let mut user = User::placeholder();
        user.username = "mei".to_string();
        assert_eq!(user.display_name(), "mei");
        user.full_name = "Mei Ling".to_string();
        assert_eq!(user.display_name(), "Mei Ling");
    }

    #[test]
    fn test_user_serializes_camel_case_fields() {
        let value = serde_json::to_value(User::placeholder()).unwrap();
        assert!(value.get("fullName").is_some());
        assert!(value.get("wechatId").is_some());
        assert!(value.get("profilePicture").is_none());
    }

    #[test]
    fn test_password_change_validation() {
        let mut change = PasswordChange {
            current_password: "old".to_string(),
            new_password: "new".to_string(),
            confirm_password: String::new(),
        };
        assert_eq!(change.validate(), Err("Password is empty!"));

        change.confirm_password = "other".to_string();
        assert_eq!(change.validate(), Err("New passwords do not match"));

        change.confirm_password = "new".to_string();
        assert_eq!(change.validate(), Ok(()));

        let body = serde_json::to_value(change.body()).unwrap();
        assert_eq!(body, serde_json::json!({"currentPassword": "old", "newPassword": "new"}));
    }
}

pub const ANONYMOUS_NAME: &str = "Anonymous";
pub const DEFAULT_PROFILE_IMAGE: &str = "/avatar-default.jpg";

/// Headers set by the authentication layer in front of the server
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_IMAGE_HEADER: &str = "x-user-profile-image";

/// User context handed over by the authentication layer
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    pub name: String,
    pub profile_image: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Author {
    User(UserRef),
    Anonymous,
}

/// What clients render next to a topic or reply
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayUser {
    pub name: String,
    pub profile_image: String,
}

impl Author {
    /// Anonymous posting hides the user even when one is logged in
    pub fn for_request(user: Option<UserRef>, anonymous: bool) -> Author {
        match user {
            Some(u) if !anonymous => Author::User(u),
            _ => Author::Anonymous,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Author::Anonymous)
    }

    pub fn display(&self) -> DisplayUser {
        match self {
            Author::User(u) => DisplayUser {
                name: u.name.clone(),
                profile_image: u
                    .profile_image
                    .clone()
                    .unwrap_or_else(|| String::from(DEFAULT_PROFILE_IMAGE)),
            },
            Author::Anonymous => DisplayUser {
                name: String::from(ANONYMOUS_NAME),
                profile_image: String::from(DEFAULT_PROFILE_IMAGE),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserRef {
        UserRef {
            id: String::from("u1"),
            name: String::from("Alice"),
            profile_image: None,
        }
    }

    #[test]
    fn anonymous_flag_hides_user() {
        assert_eq!(Author::for_request(Some(alice()), true), Author::Anonymous);
        assert_eq!(Author::for_request(None, false), Author::Anonymous);
        assert_eq!(
            Author::for_request(Some(alice()), false),
            Author::User(alice())
        );
        assert!(Author::for_request(None, false).is_anonymous());
        assert!(!Author::for_request(Some(alice()), false).is_anonymous());
    }

    #[test]
    fn display_falls_back_to_default_image() {
        let d = Author::User(alice()).display();
        assert_eq!(d.name, "Alice");
        assert_eq!(d.profile_image, DEFAULT_PROFILE_IMAGE);
        assert_eq!(Author::Anonymous.display().name, ANONYMOUS_NAME);
    }
}

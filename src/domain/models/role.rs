use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Anything that isn't explicitly the assistant is replayed to the provider
    /// as the user.
    pub fn parse(role: &str) -> Role {
        if role == "assistant" {
            return Role::Assistant;
        }

        return Role::User;
    }

    pub fn label(&self) -> String {
        match self {
            Role::User => return String::from("You"),
            Role::Assistant => return String::from("MQ Assistant"),
        }
    }
}

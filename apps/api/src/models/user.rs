use serde::{Deserialize, Serialize};

/// The `info` item of a user. `user_tel` holds KMS ciphertext at rest and
/// plaintext once it has been through `PhoneCipher::decrypt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_uuid: String,
    pub user_nm: String,
    pub user_nicknm: String,
    pub user_gender: String,
    pub user_birthday: String,
    pub user_tel: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHistory {
    pub user_itv_cnt: u32,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub user_info: UserInfo,
    pub user_history: UserHistory,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub name: String,
    pub nickname: String,
    pub gender: String,
    pub birthday: String,
    pub tel: String,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub user_id: String,
    pub user_nm: Option<String>,
    pub user_nicknm: Option<String>,
    pub user_gender: Option<String>,
    pub user_birthday: Option<String>,
    pub user_tel: Option<String>,
}

impl UpdateUserRequest {
    /// `(attribute, new value)` pairs in a fixed order.
    pub fn requested(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("user_nm", self.user_nm.as_deref()),
            ("user_nicknm", self.user_nicknm.as_deref()),
            ("user_gender", self.user_gender.as_deref()),
            ("user_birthday", self.user_birthday.as_deref()),
            ("user_tel", self.user_tel.as_deref()),
        ]
    }
}

impl UserInfo {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "user_uuid" => Some(&self.user_uuid),
            "user_nm" => Some(&self.user_nm),
            "user_nicknm" => Some(&self.user_nicknm),
            "user_gender" => Some(&self.user_gender),
            "user_birthday" => Some(&self.user_birthday),
            "user_tel" => Some(&self.user_tel),
            _ => None,
        }
    }
}

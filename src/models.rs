//! QHelper Data Models
//!
//! Profile records as stored inside the encrypted vault payload.

use serde::{Deserialize, Serialize};

/// Sentinel id of the anonymous profile
pub const GUEST_ID: &str = "guest";

/// Display name of the anonymous profile
pub const GUEST_NAME: &str = "Guest";

/// Stored user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub blood_group: String,
    /// Free-text pre-existing conditions
    #[serde(default)]
    pub pre_cond: String,
}

impl Profile {
    /// The guest sentinel: `id = "guest"`, every other field empty.
    pub fn guest() -> Self {
        Self {
            id: GUEST_ID.to_string(),
            name: GUEST_NAME.to_string(),
            age: String::new(),
            sex: String::new(),
            blood_group: String::new(),
            pre_cond: String::new(),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.id == GUEST_ID
    }

    pub(crate) fn from_fields(id: String, fields: ProfileFields) -> Self {
        Self {
            id,
            name: fields.name,
            age: fields.age,
            sex: fields.sex,
            blood_group: fields.blood_group,
            pre_cond: fields.pre_cond,
        }
    }

    pub(crate) fn apply(&mut self, fields: ProfileFields) {
        self.name = fields.name;
        self.age = fields.age;
        self.sex = fields.sex;
        self.blood_group = fields.blood_group;
        self.pre_cond = fields.pre_cond;
    }
}

/// Editable profile fields (everything but `id`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub name: String,
    pub age: String,
    pub sex: String,
    pub blood_group: String,
    pub pre_cond: String,
}

impl From<&Profile> for ProfileFields {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            age: profile.age.clone(),
            sex: profile.sex.clone(),
            blood_group: profile.blood_group.clone(),
            pre_cond: profile.pre_cond.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_sentinel_shape() {
        let guest = Profile::guest();
        assert!(guest.is_guest());
        assert_eq!(guest.name, "Guest");
        assert!(guest.age.is_empty() && guest.sex.is_empty());
        assert!(guest.blood_group.is_empty() && guest.pre_cond.is_empty());
    }

    #[test]
    fn test_payload_field_names() {
        let profile = Profile::from_fields(
            "1712345678901".to_string(),
            ProfileFields {
                name: "Ana".to_string(),
                age: "40".to_string(),
                sex: "F".to_string(),
                blood_group: "B+".to_string(),
                pre_cond: "diabetes".to_string(),
            },
        );
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["blood_group"], "B+");
        assert_eq!(json["pre_cond"], "diabetes");

        // Entries written by older clients may lack optional fields.
        let parsed: Profile = serde_json::from_str(r#"{"id":"1","name":"Old"}"#).unwrap();
        assert_eq!(parsed.age, "");
    }
}

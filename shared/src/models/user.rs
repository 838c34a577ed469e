//! User models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered recipient. The alerting core reads name, phone, home
/// location and the promo opt-in flag; everything else about an account is
/// out of its scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// WhatsApp-capable phone number in E.164-ish form; may be empty when
    /// the user never provided one.
    pub phone: String,
    pub location_id: Option<Uuid>,
    pub accepts_promos: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the daily promotional broadcast may target this user.
    pub fn promo_eligible(&self) -> bool {
        self.accepts_promos && !self.phone.is_empty() && self.location_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(accepts: bool, phone: &str, location: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Maria".to_string(),
            phone: phone.to_string(),
            location_id: location,
            accepts_promos: accepts,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn promo_eligibility_requires_opt_in_phone_and_location() {
        let loc = Some(Uuid::new_v4());
        assert!(user(true, "+5587999990000", loc).promo_eligible());
        assert!(!user(false, "+5587999990000", loc).promo_eligible());
        assert!(!user(true, "", loc).promo_eligible());
        assert!(!user(true, "+5587999990000", None).promo_eligible());
    }
}

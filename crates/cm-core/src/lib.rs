//! car-management/crates/cm-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the car catalogue.

pub mod error;
pub mod forms;
pub mod models;
pub mod policy;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use chrono::Utc;

    #[test]
    fn test_display_strings() {
        let car = Car {
            id: 1,
            make: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2020,
            description: "test".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner_id: 1,
            owner: "alice".to_string(),
        };
        let comment = Comment {
            id: 1,
            content: "Hello Rust!".to_string(),
            created_at: Utc::now(),
            car_id: car.id,
            author_id: 2,
            author: "bob".to_string(),
        };
        assert_eq!(car.to_string(), "2020 Toyota Camry");
        assert_eq!(comment.describe(&car), "Comment by bob on 2020 Toyota Camry");
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            date_joined: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}

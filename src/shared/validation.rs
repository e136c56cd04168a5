use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating user id fields
    /// Portal ids are hex object ids or UUIDs; anything URL-safe up to 64 chars is accepted
    /// - Valid: "65f1c2a9e4b0a1b2c3d4e5f6", "0190c5d2-7b7a-7c3e-9f0e-2d1b3a4c5d6e", "user_42"
    /// - Invalid: "", "a b", "id;drop", "../etc"
    pub static ref USER_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

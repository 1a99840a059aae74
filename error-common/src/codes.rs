// Standardized error codes for the EventHub engine

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
}

pub mod not_found {
    pub const RESOURCE_NOT_FOUND: &str = "NOT_FOUND_4004";
}

pub mod conflict {
    pub const DUPLICATE_RESOURCE: &str = "CONFLICT_5001";
}

pub mod media {
    pub const UNSUPPORTED_MEDIA_TYPE: &str = "MEDIA_6001";
}

pub mod delivery {
    pub const EMAIL_DELIVERY_FAILED: &str = "DELIVERY_7001";
}

pub mod internal {
    pub const INTERNAL_ERROR: &str = "INTERNAL_9001";
}

// @fileoverview Result codes reported by the secure store
//
// Mirrors the OSStatus values the Security framework returns from its item
// calls. Non-Apple backends translate their own failures into the same set.

use std::fmt;

pub const ERR_SEC_SUCCESS: i32 = 0;
pub const ERR_SEC_PARAM: i32 = -50;
pub const ERR_SEC_USER_CANCELED: i32 = -128;
pub const ERR_SEC_AUTH_FAILED: i32 = -25293;
pub const ERR_SEC_NOT_AVAILABLE: i32 = -25291;
pub const ERR_SEC_DUPLICATE_ITEM: i32 = -25299;
pub const ERR_SEC_ITEM_NOT_FOUND: i32 = -25300;
pub const ERR_SEC_INTERACTION_NOT_ALLOWED: i32 = -25308;
pub const ERR_SEC_DECODE: i32 = -26275;
pub const ERR_SEC_MISSING_ENTITLEMENT: i32 = -34018;

/// Status of a single store call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    ItemNotFound,
    DuplicateItem,
    UserCanceled,
    AuthFailed,
    /// The item's accessibility policy forbids access in the current lock state
    InteractionNotAllowed,
    Param,
    NotAvailable,
    MissingEntitlement,
    Decode,
    Other(i32),
}

impl Status {
    pub fn from_code(code: i32) -> Self {
        match code {
            ERR_SEC_SUCCESS => Status::Success,
            ERR_SEC_ITEM_NOT_FOUND => Status::ItemNotFound,
            ERR_SEC_DUPLICATE_ITEM => Status::DuplicateItem,
            ERR_SEC_USER_CANCELED => Status::UserCanceled,
            ERR_SEC_AUTH_FAILED => Status::AuthFailed,
            ERR_SEC_INTERACTION_NOT_ALLOWED => Status::InteractionNotAllowed,
            ERR_SEC_PARAM => Status::Param,
            ERR_SEC_NOT_AVAILABLE => Status::NotAvailable,
            ERR_SEC_MISSING_ENTITLEMENT => Status::MissingEntitlement,
            ERR_SEC_DECODE => Status::Decode,
            other => Status::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Status::Success => ERR_SEC_SUCCESS,
            Status::ItemNotFound => ERR_SEC_ITEM_NOT_FOUND,
            Status::DuplicateItem => ERR_SEC_DUPLICATE_ITEM,
            Status::UserCanceled => ERR_SEC_USER_CANCELED,
            Status::AuthFailed => ERR_SEC_AUTH_FAILED,
            Status::InteractionNotAllowed => ERR_SEC_INTERACTION_NOT_ALLOWED,
            Status::Param => ERR_SEC_PARAM,
            Status::NotAvailable => ERR_SEC_NOT_AVAILABLE,
            Status::MissingEntitlement => ERR_SEC_MISSING_ENTITLEMENT,
            Status::Decode => ERR_SEC_DECODE,
            Status::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    pub fn is_not_found(self) -> bool {
        self == Status::ItemNotFound
    }

    /// Short human readable description
    pub fn description(self) -> &'static str {
        match self {
            Status::Success => "no error",
            Status::ItemNotFound => "the specified item could not be found",
            Status::DuplicateItem => "the specified item already exists",
            Status::UserCanceled => "the user canceled the operation",
            Status::AuthFailed => "authorization or authentication failed",
            Status::InteractionNotAllowed => "user interaction is not allowed",
            Status::Param => "one or more parameters were not valid",
            Status::NotAvailable => "no keychain is available",
            Status::MissingEntitlement => "a required entitlement is missing",
            Status::Decode => "unable to decode the provided data",
            Status::Other(_) => "unrecognized store status",
        }
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Status::from_code(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.description(), self.code())
    }
}

//! # Well-Known Terms
//!
//! Fixed reference concepts used as payload values and STAMP coordinates:
//! languages, case significance, acceptability, dialect patterns, and the
//! development author/module/path.
//!
//! Public ids are constant so that every store agrees on them.

use crate::{EntityRef, PublicId};

pub const ENGLISH_LANGUAGE_ID: PublicId =
    PublicId::from_u128(0x06d9_0e11_0c1b_4a59_9f2f_a3e6_7a41_6c01);
pub const DESCRIPTION_NOT_CASE_SENSITIVE_ID: PublicId =
    PublicId::from_u128(0x0e4c_8c35_7b1d_4c0a_8a16_54d2_f5e9_3b02);
pub const DESCRIPTION_CASE_SENSITIVE_ID: PublicId =
    PublicId::from_u128(0x1c7f_23a8_5d6e_4f31_b0c4_9e81_2d47_aa03);
pub const DESCRIPTION_INITIAL_CHARACTER_CASE_SENSITIVE_ID: PublicId =
    PublicId::from_u128(0x2a91_6b4d_e3f0_4d77_86b5_0c3a_91fe_5d04);
pub const PREFERRED_ID: PublicId = PublicId::from_u128(0x3f08_d2c6_1a5b_4e92_a7d3_6b1f_0c28_e405);
pub const ACCEPTABLE_ID: PublicId = PublicId::from_u128(0x44b5_79e0_8c2d_4b1f_9e6a_d3c7_15f2_7b06);
pub const US_ENGLISH_DIALECT_ID: PublicId =
    PublicId::from_u128(0x5b2e_0f94_7d63_4a8c_b1e5_28d9_6c0a_f307);
pub const GB_ENGLISH_DIALECT_ID: PublicId =
    PublicId::from_u128(0x61d4_a8b7_3e0c_4f56_8d29_f7a1_b4e3_0c08);
pub const USER_ID: PublicId = PublicId::from_u128(0x7e39_c15a_b6f2_4d0e_a48b_03f6_d9c2_1e09);
pub const DEVELOPMENT_MODULE_ID: PublicId =
    PublicId::from_u128(0x8a67_f3d1_2c9e_4b85_b3f0_6e4d_a1c7_520a);
pub const DEVELOPMENT_PATH_ID: PublicId =
    PublicId::from_u128(0x9c15_4e2b_d8a7_4f60_81c3_b5e9_07d6_f40b);

#[must_use]
pub fn english_language() -> EntityRef {
    EntityRef::known("English language", ENGLISH_LANGUAGE_ID)
}

#[must_use]
pub fn description_not_case_sensitive() -> EntityRef {
    EntityRef::known(
        "Description not case sensitive",
        DESCRIPTION_NOT_CASE_SENSITIVE_ID,
    )
}

#[must_use]
pub fn description_case_sensitive() -> EntityRef {
    EntityRef::known("Description case sensitive", DESCRIPTION_CASE_SENSITIVE_ID)
}

#[must_use]
pub fn description_initial_character_case_sensitive() -> EntityRef {
    EntityRef::known(
        "Description initial character case sensitive",
        DESCRIPTION_INITIAL_CHARACTER_CASE_SENSITIVE_ID,
    )
}

#[must_use]
pub fn preferred() -> EntityRef {
    EntityRef::known("Preferred", PREFERRED_ID)
}

#[must_use]
pub fn acceptable() -> EntityRef {
    EntityRef::known("Acceptable", ACCEPTABLE_ID)
}

/// Pattern for United States English dialect acceptability.
#[must_use]
pub fn us_english_dialect() -> EntityRef {
    EntityRef::known("US English dialect", US_ENGLISH_DIALECT_ID)
}

/// Pattern for Great Britain English dialect acceptability.
#[must_use]
pub fn gb_english_dialect() -> EntityRef {
    EntityRef::known("GB English dialect", GB_ENGLISH_DIALECT_ID)
}

#[must_use]
pub fn user() -> EntityRef {
    EntityRef::known("User", USER_ID)
}

#[must_use]
pub fn development_module() -> EntityRef {
    EntityRef::known("Development module", DEVELOPMENT_MODULE_ID)
}

#[must_use]
pub fn development_path() -> EntityRef {
    EntityRef::known("Development path", DEVELOPMENT_PATH_ID)
}

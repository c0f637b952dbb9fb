//! Storage layout of every entity: table, key, search columns and route path.

use worldforge_schema::ResponseCode;
use worldforge_schema::SchemaDescriptor;
use worldforge_schema::entities::{ABILITY, CHARACTER, NATION, PROJECT, TRAIT};

#[derive(Debug)]
pub struct TableSpec {
    pub table: &'static str,
    pub schema: &'static SchemaDescriptor,
    /// Route prefix, also the key used by client-side response normalization.
    pub path: &'static str,
    /// Human readable name used in messages.
    pub label: &'static str,
    pub key_field: &'static str,
    pub key_column: &'static str,
    /// Field that must be a non-blank string on create.
    pub name_field: &'static str,
    /// Canonical field names matched by `searchKeyword`.
    pub searchable: &'static [&'static str],
    /// Column filtered by the `prjNo` list parameter, for project-scoped entities.
    pub parent_column: Option<&'static str>,
    /// Columns that exist only in the networked schema.
    pub networked_only: &'static [&'static str],
    pub not_found: ResponseCode,
}

impl TableSpec {
    pub fn searchable_column(&self, name: &str) -> Option<&'static str> {
        if !self.searchable.contains(&name) {
            return None;
        }
        self.schema.field(name).map(|f| f.column)
    }
}

pub static PROJECTS: TableSpec = TableSpec {
    table: "projects",
    schema: &PROJECT,
    path: "/projects",
    label: "Project",
    key_field: "prjNo",
    key_column: "prj_no",
    name_field: "prjNm",
    searchable: &["prjNm", "prjDesc"],
    parent_column: None,
    networked_only: &["user_no", "tags"],
    not_found: ResponseCode::ProjectNotFound,
};

pub static TRAITS: TableSpec = TableSpec {
    table: "traits",
    schema: &TRAIT,
    path: "/traits",
    label: "Trait",
    key_field: "traitNo",
    key_column: "trait_no",
    name_field: "traitNm",
    searchable: &["traitNm", "traitExpln"],
    parent_column: None,
    networked_only: &["tags"],
    not_found: ResponseCode::TraitNotFound,
};

pub static ABILITIES: TableSpec = TableSpec {
    table: "abilities",
    schema: &ABILITY,
    path: "/abilities",
    label: "Ability",
    key_field: "abilityNo",
    key_column: "ability_no",
    name_field: "abilityNm",
    searchable: &["abilityNm", "abilityExpln"],
    parent_column: None,
    networked_only: &["tags"],
    not_found: ResponseCode::AbilityNotFound,
};

pub static CHARACTERS: TableSpec = TableSpec {
    table: "characters",
    schema: &CHARACTER,
    path: "/characters",
    label: "Character",
    key_field: "charNo",
    key_column: "char_no",
    name_field: "charNm",
    searchable: &["charNm", "aliasNm", "logline"],
    parent_column: Some("prj_no"),
    networked_only: &["tags"],
    not_found: ResponseCode::CharacterNotFound,
};

pub static NATIONS: TableSpec = TableSpec {
    table: "nations",
    schema: &NATION,
    path: "/nations",
    label: "Nation",
    key_field: "ntnNo",
    key_column: "ntn_no",
    name_field: "ntnNm",
    searchable: &["ntnNm", "logline"],
    parent_column: Some("prj_no"),
    networked_only: &["tags"],
    not_found: ResponseCode::NationNotFound,
};

pub static ALL: [&TableSpec; 5] = [&PROJECTS, &TRAITS, &ABILITIES, &CHARACTERS, &NATIONS];

use crate::descriptor::{FieldDescriptor, FieldType, SchemaDescriptor, field};

const FIELDS: &[FieldDescriptor] = &[
    field("charNo", "char_no", FieldType::Integer).key(),
    field("prjNo", "prj_no", FieldType::Integer),
    field("charNm", "char_nm", FieldType::Text),
    field("aliasNm", "alias_nm", FieldType::Text),
    field("roleType", "role_type", FieldType::Text),
    field("logline", "logline", FieldType::Text),
    field("narrFunc", "narr_func", FieldType::Text),
    field("raceNo", "race_no", FieldType::Integer),
    field("ntnNo", "ntn_no", FieldType::Integer),
    field("orgNo", "org_no", FieldType::Integer),
    field("orgRank", "org_rank", FieldType::Text),
];

pub static CHARACTER: SchemaDescriptor = SchemaDescriptor::new("character", FIELDS);

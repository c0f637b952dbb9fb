use crate::descriptor::{FieldDescriptor, FieldType, SchemaDescriptor, field};

const FIELDS: &[FieldDescriptor] = &[
    field("traitNo", "trait_no", FieldType::Integer).key(),
    field("traitNm", "trait_nm", FieldType::Text),
    field("traitExpln", "trait_expln", FieldType::Text),
    field("traitLcls", "trait_lcls", FieldType::Text),
    field("traitMcls", "trait_mcls", FieldType::Text),
    // CHAR, ITEM, NATION, ORG, REGION
    field("aplyTrgt", "aply_trgt", FieldType::Text),
    field("cnflTraitNo", "cnfl_trait_no", FieldType::Integer),
];

pub static TRAIT: SchemaDescriptor = SchemaDescriptor::new("trait", FIELDS);

use crate::descriptor::{FieldDescriptor, FieldType, SchemaDescriptor, field};

const FIELDS: &[FieldDescriptor] = &[
    field("abilityNo", "ability_no", FieldType::Integer).key(),
    field("abilityNm", "ability_nm", FieldType::Text),
    field("abilityType", "ability_type", FieldType::Text),
    field("abilityLcls", "ability_lcls", FieldType::Text),
    field("abilityExpln", "ability_expln", FieldType::Text),
    field("trgtType", "trgt_type", FieldType::Text),
    field("dmgType", "dmg_type", FieldType::Text),
    field("statEffType", "stat_eff_type", FieldType::Text),
    field("useCost", "use_cost", FieldType::Text),
    field("coolTime", "cool_time", FieldType::Integer),
    field("castTime", "cast_time", FieldType::Integer),
    field("useCnd", "use_cnd", FieldType::Text),
];

pub static ABILITY: SchemaDescriptor = SchemaDescriptor::new("ability", FIELDS);

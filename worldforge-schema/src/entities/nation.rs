use crate::descriptor::{FieldDefault, FieldDescriptor, FieldType, SchemaDescriptor, field};

const FIELDS: &[FieldDescriptor] = &[
    field("ntnNo", "ntn_no", FieldType::Integer).key(),
    field("prjNo", "prj_no", FieldType::Integer),
    field("ntnNm", "ntn_nm", FieldType::Text),
    field("ntnType", "ntn_type", FieldType::Text),
    field("logline", "logline", FieldType::Text),
    field("capitalNm", "capital_nm", FieldType::Text),
    field("rulerTxt", "ruler_txt", FieldType::Text),
    field("polSys", "pol_sys", FieldType::Text),
    field("adminLaw", "admin_law", FieldType::Text),
    field("stateRlgn", "state_rlgn", FieldType::Text),
    field("rlgnDesc", "rlgn_desc", FieldType::Text),
    field("natIdlg", "nat_idlg", FieldType::Text),
    field("mainPlcy", "main_plcy", FieldType::Text),
    field("tabooAct", "taboo_act", FieldType::Text),
    field("diplPlcy", "dipl_plcy", FieldType::Text),
    field("intrCnfl", "intr_cnfl", FieldType::Text),
    field("hiddenFact", "hidden_fact", FieldType::Text),
    field("econStruct", "econ_struct", FieldType::Text),
    field("socCltr", "soc_cltr", FieldType::Text),
    field("milPwr", "mil_pwr", FieldType::Text),
    field("histDesc", "hist_desc", FieldType::Text),
    field("currIssue", "curr_issue", FieldType::Text),
    field("loreType", "lore_type", FieldType::Text)
        .with_default(FieldDefault::Text("NATION")),
    field("subLoreType", "sub_lore_type", FieldType::Text),
];

pub static NATION: SchemaDescriptor = SchemaDescriptor::new("nation", FIELDS);

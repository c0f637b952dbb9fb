//! Fields shared by every entity table, plus list bookkeeping fields.

use crate::descriptor::{FieldDescriptor, FieldType, field};

pub const COMMON_FIELDS: &[FieldDescriptor] = &[
    field("useYn", "use_yn", FieldType::YesNo),
    field("shrnYn", "shrn_yn", FieldType::YesNo),
    field("delYn", "del_yn", FieldType::YesNo).managed(),
    // Comma separated, or a JSON array encoded as text.
    field("tags", "tags", FieldType::Text),
    field("crtNo", "crt_no", FieldType::Integer).managed(),
    field("crtDt", "crt_dt", FieldType::DateTime).managed(),
    field("updtNo", "updt_no", FieldType::Integer).managed(),
    field("updtDt", "updt_dt", FieldType::DateTime).managed(),
    field("delNo", "del_no", FieldType::Integer).managed(),
    field("delDt", "del_dt", FieldType::DateTime).managed(),
    field("rowNo", "row_no", FieldType::Integer).virtual_only(),
    field("totalCnt", "total_cnt", FieldType::Integer).virtual_only(),
];

use crate::descriptor::{FieldDescriptor, FieldType, SchemaDescriptor, field};

const FIELDS: &[FieldDescriptor] = &[
    field("prjNo", "prj_no", FieldType::Integer).key(),
    field("prjNm", "prj_nm", FieldType::Text),
    field("genreType", "genre_type", FieldType::Text),
    field("prjDesc", "prj_desc", FieldType::Text),
    field("cvrImgUrl", "cvr_img_url", FieldType::Text),
    field("prjExpln", "prj_expln", FieldType::Text),
    field("prjVer", "prj_ver", FieldType::Text),
    field("userNo", "user_no", FieldType::Integer).owner(),
    field("prjNoList", "prj_no_list", FieldType::IntegerList).virtual_only(),
];

pub static PROJECT: SchemaDescriptor = SchemaDescriptor::new("project", FIELDS);

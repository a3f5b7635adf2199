//! Schema type deriver.
//!
//! Walks one custom type and emits composite type definitions plus
//! type-path entries through a [`TypeSink`]. The walk itself is pure: it
//! never decides where definitions end up.
//!
//! # Paths
//!
//! | Field                       | Path                                          |
//! |-----------------------------|-----------------------------------------------|
//! | document                    | `[page]`                                      |
//! | UID                         | `[page, uid]`                                 |
//! | data field                  | `[page, data, title]`                         |
//! | group sub-field             | `[page, data, links, label]`                  |
//! | slice primary field         | `[page, data, body, quote, primary, text]`    |
//! | slice item field            | `[page, data, body, gallery, items, image]`   |

use std::collections::BTreeMap;

use super::{
    CustomType, FieldDef, FieldKind, Fields, SchemaSet,
    naming::TypeNamer,
    types::{FieldType, Interface, STANDARD_TYPE_NAMES, TypeDef, TypeRef},
};
use crate::{
    log,
    type_paths::{IMAGE_TYPE, LINK_TYPE, RICH_TEXT_TYPE, TypeDescriptor, TypePathIndex, extend_path},
};

/// Union over every document type, used by link fields.
pub const ALL_DOCUMENT_TYPES: &str = "PrismicAllDocumentTypes";

/// Key under which the API returns the UID, outside `data`.
pub const UID_FIELD: &str = "uid";

const UID_DESCRIPTION: &str =
    "The document's unique identifier. Unique among all instances of the document's type.";

/// Receives the deriver's output.
pub trait TypeSink {
    fn enqueue_type_def(&mut self, def: TypeDef);
    fn enqueue_type_path(&mut self, path: Vec<String>, ty: TypeDescriptor);
}

/// Collected output of a derivation session.
#[derive(Debug, Default)]
pub struct DerivedTypes {
    pub type_defs: Vec<TypeDef>,
    pub type_paths: TypePathIndex,
}

impl TypeSink for DerivedTypes {
    fn enqueue_type_def(&mut self, def: TypeDef) {
        self.type_defs.push(def);
    }

    fn enqueue_type_path(&mut self, path: Vec<String>, ty: TypeDescriptor) {
        self.type_paths.push(path, ty);
    }
}

impl DerivedTypes {
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.type_defs.iter().find(|def| def.name == name)
    }

    /// Full GraphQL SDL: standard types followed by derived ones.
    pub fn to_sdl(&self) -> String {
        let mut sdl = String::from(super::types::STANDARD_TYPES_SDL);
        for def in &self.type_defs {
            sdl.push('\n');
            sdl.push_str(&def.to_sdl());
            sdl.push('\n');
        }
        sdl
    }
}

/// Structural context carried through the walk.
#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    custom_type_id: &'a str,
    slice_zone_id: Option<&'a str>,
}

struct Deriver<'a> {
    namer: &'a mut TypeNamer,
    sink: &'a mut dyn TypeSink,
}


fn owner(path: &[String], role: &str) -> String {
    format!("{}#{role}", path.join("/"))
}

impl Deriver<'_> {
    /// Derive the type of one field. `None` means the field is skipped.
    fn field_to_type(
        &mut self,
        id: &str,
        field: &FieldDef,
        depth: &[String],
        ctx: Context<'_>,
    ) -> Option<FieldType> {
        let path = extend_path(depth, &[id]);

        let Some(kind) = field.field_kind() else {
            log!("schema"; "unprocessed field `{id}` of kind `{}` in `{}`", field.kind, ctx.custom_type_id);
            return None;
        };

        let scalar = |name: &str| (TypeDescriptor::Scalar(name.to_owned()), TypeRef::named(name));

        let (descriptor, ty) = match kind {
            FieldKind::Uid => {
                let (descriptor, ty) = scalar("String");
                self.sink.enqueue_type_path(path, descriptor);
                return Some(FieldType::described(ty, UID_DESCRIPTION));
            }
            FieldKind::Color | FieldKind::Select | FieldKind::Text => scalar("String"),
            FieldKind::Number => scalar("Float"),
            FieldKind::Date | FieldKind::Timestamp => scalar("Date"),
            FieldKind::GeoPoint => scalar("PrismicGeoPointType"),
            FieldKind::Embed => scalar("PrismicEmbedType"),
            FieldKind::StructuredText => (TypeDescriptor::RichText, TypeRef::named(RICH_TEXT_TYPE)),
            FieldKind::Image => (TypeDescriptor::Image, TypeRef::named(IMAGE_TYPE)),
            FieldKind::Link => (TypeDescriptor::Link, TypeRef::named(LINK_TYPE)),
            FieldKind::Group => {
                let name = self.namer.name_for(
                    &owner(&path, "group"),
                    &["Prismic", ctx.custom_type_id, id, "Group Type"],
                );
                let fields = self.object_fields(&field.config.fields, &path, ctx);
                self.sink.enqueue_type_def(TypeDef::object(&name, fields));
                (TypeDescriptor::Group(name.clone()), TypeRef::list_of(name))
            }
            FieldKind::Slice => return self.slice_to_type(id, field, depth, ctx),
            FieldKind::Slices => {
                let zone_ctx = Context {
                    slice_zone_id: Some(id),
                    ..ctx
                };
                let choices: Vec<String> = field
                    .config
                    .choices
                    .iter()
                    .filter_map(|(choice_id, choice)| {
                        self.field_to_type(choice_id, choice, &path, zone_ctx)
                    })
                    .map(|choice| choice.ty.name)
                    .collect();

                if choices.is_empty() {
                    log!("schema"; "slice zone `{id}` in `{}` has no usable choices", ctx.custom_type_id);
                    return None;
                }

                let name = self.namer.name_for(
                    &owner(&path, "slices"),
                    &["Prismic", ctx.custom_type_id, id, "Slices Type"],
                );
                self.sink.enqueue_type_def(TypeDef::union(&name, choices));
                (TypeDescriptor::Slices(name.clone()), TypeRef::list_of(name))
            }
        };

        self.sink.enqueue_type_path(path, descriptor);
        Some(ty.into())
    }

    /// A slice yields up to three types: primary, item and the slice itself.
    fn slice_to_type(
        &mut self,
        id: &str,
        field: &FieldDef,
        depth: &[String],
        ctx: Context<'_>,
    ) -> Option<FieldType> {
        let Some(zone_id) = ctx.slice_zone_id else {
            log!("schema"; "slice `{id}` declared outside a slice zone in `{}`", ctx.custom_type_id);
            return None;
        };
        let path = extend_path(depth, &[id]);
        let words = |role: &'static str| ["Prismic", ctx.custom_type_id, zone_id, id, role];

        let mut slice_fields = BTreeMap::new();
        slice_fields.insert("id".to_owned(), TypeRef::named("ID").required().into());
        slice_fields.insert("slice_type".to_owned(), TypeRef::named("String").into());
        slice_fields.insert("slice_label".to_owned(), TypeRef::named("String").into());

        if !field.non_repeat.is_empty() {
            let primary_path = extend_path(&path, &["primary"]);
            let name = self.namer.name_for(&owner(&primary_path, "primary"), &words("Primary Type"));
            let fields = self.object_fields(&field.non_repeat, &primary_path, ctx);
            self.sink.enqueue_type_def(TypeDef::object(&name, fields));
            self.sink.enqueue_type_path(primary_path, TypeDescriptor::Object(name.clone()));
            slice_fields.insert("primary".to_owned(), TypeRef::named(name).into());
        }

        if !field.repeat.is_empty() {
            let items_path = extend_path(&path, &["items"]);
            let name = self.namer.name_for(&owner(&items_path, "items"), &words("Item Type"));
            let fields = self.object_fields(&field.repeat, &items_path, ctx);
            self.sink.enqueue_type_def(TypeDef::object(&name, fields));
            self.sink.enqueue_type_path(items_path, TypeDescriptor::Group(name.clone()));
            slice_fields.insert("items".to_owned(), TypeRef::list_of(name).into());
        }

        let name = self.namer.name_for(
            &owner(&path, "slice"),
            &["Prismic", ctx.custom_type_id, zone_id, id],
        );
        self.sink
            .enqueue_type_def(TypeDef::object(&name, slice_fields).with_interfaces(&[Interface::Node]));
        self.sink.enqueue_type_path(path, TypeDescriptor::Object(name.clone()));
        Some(TypeRef::named(name).into())
    }

    fn object_fields(
        &mut self,
        fields: &Fields,
        depth: &[String],
        ctx: Context<'_>,
    ) -> BTreeMap<String, FieldType> {
        fields
            .iter()
            .filter_map(|(id, field)| {
                self.field_to_type(id, field, depth, ctx)
                    .map(|ty| (id.clone(), ty))
            })
            .collect()
    }
}

/// Derive types and type paths for one custom type.
pub fn derive_custom_type(
    id: &str,
    custom_type: &CustomType,
    namer: &mut TypeNamer,
    sink: &mut dyn TypeSink,
) {
    let mut deriver = Deriver { namer, sink };
    let ctx = Context {
        custom_type_id: id,
        slice_zone_id: None,
    };
    let root = vec![id.to_owned()];

    let mut data_fields = custom_type.merged_fields();
    let has_uid = data_fields
        .get(UID_FIELD)
        .is_some_and(|field| field.field_kind() == Some(FieldKind::Uid));
    let uid_field = if has_uid { data_fields.remove(UID_FIELD) } else { None };

    // The API returns the UID next to `data`, not inside it.
    let uid_type = uid_field.and_then(|field| deriver.field_to_type(UID_FIELD, &field, &root, ctx));

    let data_path = extend_path(&root, &["data"]);
    let data_types = deriver.object_fields(&data_fields, &data_path, ctx);
    let data_name = deriver
        .namer
        .name_for(&owner(&data_path, "data"), &["Prismic", id, "Data Type"]);
    deriver
        .sink
        .enqueue_type_path(data_path, TypeDescriptor::Object(data_name.clone()));
    deriver.sink.enqueue_type_def(TypeDef::object(&data_name, data_types));

    let mut fields = document_fields(&data_name);
    if let Some(uid_type) = uid_type {
        fields.insert(UID_FIELD.to_owned(), uid_type);
    }

    let name = deriver.namer.name_for(&owner(&root, "document"), &["Prismic", id]);
    deriver
        .sink
        .enqueue_type_path(root, TypeDescriptor::Object(name.clone()));
    deriver.sink.enqueue_type_def(
        TypeDef::object(name, fields).with_interfaces(&[Interface::Document, Interface::Node]),
    );
}

/// Fields every document type carries besides `uid`.
fn document_fields(data_name: &str) -> BTreeMap<String, FieldType> {
    let string = || TypeRef::named("String");
    let date = || TypeRef::named("Date").required();
    [
        ("data", FieldType::described(TypeRef::named(data_name), "The document's data fields.")),
        ("dataRaw", FieldType::described(TypeRef::named("JSON").required(), "The document's data object exactly as it comes from the API.")),
        ("dataString", FieldType::described(string().required(), "The document's data object serialized as JSON.")),
        ("first_publication_date", FieldType::described(date(), "The document's initial publication date.")),
        ("last_publication_date", FieldType::described(date(), "The document's most recent publication date.")),
        ("href", FieldType::described(string().required(), "The document's API URL.")),
        ("url", FieldType::described(string(), "The document's URL derived via the link resolver.")),
        ("id", FieldType::described(TypeRef::named("ID").required(), "Globally unique node identifier.")),
        ("prismicId", FieldType::described(TypeRef::named("ID").required(), "The document's Prismic ID.")),
        ("lang", FieldType::described(string().required(), "The document's language.")),
        ("tags", FieldType::described(TypeRef::list_of("String").required(), "The document's list of tags.")),
        ("type", FieldType::described(string().required(), "The document's custom type API ID.")),
        ("alternate_languages", FieldType::described(TypeRef::list_of(LINK_TYPE), "Translations of the document.")),
    ]
    .into_iter()
    .map(|(name, field)| (name.to_owned(), field))
    .collect()
}

/// Union over every derived object type implementing `PrismicDocument`.
pub fn all_documents_union(type_defs: &[TypeDef]) -> Option<TypeDef> {
    let documents: Vec<String> = type_defs
        .iter()
        .filter(|def| def.implements(Interface::Document))
        .map(|def| def.name.clone())
        .collect();
    (!documents.is_empty()).then(|| TypeDef::union(ALL_DOCUMENT_TYPES, documents))
}

/// Derive every custom type of a schema set in one naming session.
pub fn derive_schema_set(schemas: &SchemaSet) -> DerivedTypes {
    let reserved: Vec<&str> = STANDARD_TYPE_NAMES
        .iter()
        .copied()
        .chain([ALL_DOCUMENT_TYPES])
        .collect();
    let mut namer = TypeNamer::with_reserved(&reserved);
    let mut derived = DerivedTypes::default();

    for (id, custom_type) in schemas.iter() {
        derive_custom_type(id, custom_type, &mut namer, &mut derived);
    }

    if let Some(union) = all_documents_union(&derived.type_defs) {
        derived.enqueue_type_def(union);
    }

    log!(
        "types";
        "derived {} types and {} type paths from {} custom types",
        derived.type_defs.len(),
        derived.type_paths.len(),
        schemas.len()
    );
    derived
}

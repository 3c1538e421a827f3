//! Procedural macros for orm-resolver
//!
//! - `#[derive(Entity)]` - Generate entity metadata, schema and row decoding

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type,
};

/// Derive `DatabaseEntity`, `DatabaseSchema` and `FromSqlRow` for a struct.
///
/// # Usage
///
/// ```ignore
/// #[derive(Entity, Clone, Debug)]
/// #[entity(table = "tasks", default_sort = "created_at")]
/// pub struct Task {
///     #[primary_key]
///     pub id: i64,
///     pub title: String,
///     #[column(default = "datetime('now')")]
///     pub created_at: String,
///     pub user_id: i64,
/// }
/// ```
///
/// Supported column types are `i32`, `i64`, `u32`, `f64`, `bool` and `String`,
/// optionally wrapped in `Option<_>` for nullable columns. Without an explicit
/// `#[primary_key]` the field named `id` is used.
#[proc_macro_derive(Entity, attributes(entity, primary_key, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_entity(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// One struct field mapped to a table column
struct ColumnField {
    ident: syn::Ident,
    name: String,
    graphql_name: String,
    sql_type: &'static str,
    graphql_type: &'static str,
    nullable: bool,
    primary_key: bool,
    default: Option<String>,
}

fn expand_entity(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let mut table: Option<String> = None;
    let mut default_sort: Option<String> = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                table = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else if meta.path.is_ident("default_sort") {
                default_sort = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("expected `table` or `default_sort`"))
            }
        })?;
    }
    let table = table.ok_or_else(|| {
        syn::Error::new_spanned(name, "missing #[entity(table = \"...\")] attribute")
    })?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Entity can only be derived for structs",
            ));
        }
    };

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        columns.push(parse_column(field)?);
    }

    if !columns.iter().any(|c| c.primary_key) {
        match columns.iter_mut().find(|c| c.name == "id") {
            Some(id) => id.primary_key = true,
            None => {
                return Err(syn::Error::new_spanned(
                    name,
                    "no #[primary_key] field and no field named `id`",
                ));
            }
        }
    }

    // Checked above
    let primary_key = columns
        .iter()
        .find(|c| c.primary_key)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let default_sort = default_sort.unwrap_or_else(|| primary_key.clone());

    let column_names: Vec<&String> = columns.iter().map(|c| &c.name).collect();
    let idents: Vec<&syn::Ident> = columns.iter().map(|c| &c.ident).collect();
    let column_defs = columns.iter().map(column_def_tokens);

    Ok(quote! {
        impl ::orm_resolver::orm::DatabaseEntity for #name {
            const TABLE_NAME: &'static str = #table;
            const PRIMARY_KEY: &'static str = #primary_key;
            const DEFAULT_SORT: &'static str = #default_sort;

            fn column_names() -> &'static [&'static str] {
                &[#(#column_names),*]
            }

            fn column_value(
                &self,
                column: &str,
            ) -> ::std::option::Option<::orm_resolver::orm::SqlValue> {
                match column {
                    #(#column_names => ::std::option::Option::Some(
                        ::orm_resolver::orm::SqlValue::from(
                            ::std::clone::Clone::clone(&self.#idents),
                        ),
                    ),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::orm_resolver::orm::DatabaseSchema for #name {
            fn columns() -> &'static [::orm_resolver::orm::ColumnDef] {
                const COLUMNS: &[::orm_resolver::orm::ColumnDef] = &[#(#column_defs),*];
                COLUMNS
            }
        }

        impl ::orm_resolver::orm::FromSqlRow for #name {
            fn from_row(
                row: &::orm_resolver::sqlx::sqlite::SqliteRow,
            ) -> ::std::result::Result<Self, ::orm_resolver::sqlx::Error> {
                use ::orm_resolver::sqlx::Row as _;
                ::std::result::Result::Ok(Self {
                    #(#idents: row.try_get(#column_names)?,)*
                })
            }
        }
    })
}

fn parse_column(field: &syn::Field) -> syn::Result<ColumnField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let name = ident.to_string();

    let mut primary_key = false;
    let mut default = None;
    for attr in &field.attrs {
        if attr.path().is_ident("primary_key") {
            primary_key = true;
        } else if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    default = Some(meta.value()?.parse::<LitStr>()?.value());
                    Ok(())
                } else {
                    Err(meta.error("expected `default`"))
                }
            })?;
        }
    }

    let (inner, nullable) = match option_inner(&field.ty) {
        Some(inner) => (inner, true),
        None => (&field.ty, false),
    };
    let (sql_type, graphql_type) = column_types(inner)?;

    Ok(ColumnField {
        graphql_name: name.to_case(Case::Camel),
        ident,
        name,
        sql_type,
        graphql_type,
        nullable,
        primary_key,
        default,
    })
}

fn column_def_tokens(column: &ColumnField) -> TokenStream2 {
    let ColumnField {
        name,
        graphql_name,
        sql_type,
        graphql_type,
        nullable,
        primary_key,
        ..
    } = column;
    let default = match &column.default {
        Some(expr) => quote!(::std::option::Option::Some(#expr)),
        None => quote!(::std::option::Option::None),
    };
    quote! {
        ::orm_resolver::orm::ColumnDef {
            name: #name,
            graphql_name: #graphql_name,
            sql_type: #sql_type,
            graphql_type: #graphql_type,
            nullable: #nullable,
            is_primary_key: #primary_key,
            default: #default,
        }
    }
}

/// Return `T` for a field typed `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Map a Rust field type to its (SQLite, GraphQL) type names
fn column_types(ty: &Type) -> syn::Result<(&'static str, &'static str)> {
    let ident = match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    };
    match ident.as_deref() {
        Some("i32" | "i64" | "u32") => Ok(("INTEGER", "Int")),
        Some("f64") => Ok(("REAL", "Float")),
        Some("bool") => Ok(("INTEGER", "Boolean")),
        Some("String") => Ok(("TEXT", "String")),
        _ => Err(syn::Error::new_spanned(
            ty,
            "unsupported column type (expected i32, i64, u32, f64, bool or String)",
        )),
    }
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Type, Visibility, parse_macro_input};

/// Derive `Persistable` and `Field` for a struct with named fields.
///
/// Persisted fields are the `pub` fields plus private fields marked
/// `#[persist]`. Fields whose name starts with `_` are never persisted.
///
/// # Attributes
///
/// Field level:
/// - `#[persist]` — persist a private field
/// - `#[persist(skip)]` — never persist this field
/// - `#[persist(convert)]` — the field type is only handled by a registered
///   converter (it does not implement `Field`)
/// - `#[persist(base)]` — embedded base object whose fields come first
/// - `#[persist(identity)]` — `Option<ObjectHandle>` reported as the live handle
///
/// Struct level:
/// - `#[persist(name = "game::Player")]` — persisted type name override
///
/// ```ignore
/// #[derive(Default, Persistable)]
/// #[persist(name = "game::Player")]
/// struct Player {
///     #[persist(identity)]
///     handle: Option<ObjectHandle>,
///     pub health: i32,
///     pub weapon: Asset<Mesh>,
///     #[persist(convert)]
///     pub cooldown: std::time::Duration,
/// }
/// ```
#[proc_macro_derive(Persistable, attributes(persist))]
pub fn derive_persistable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct FieldAttrs {
    include: bool,
    skip: bool,
    convert: bool,
    base: bool,
    identity: bool,
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("persist") {
            continue;
        }
        attrs.include = true;
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("convert") {
                attrs.convert = true;
            } else if meta.path.is_ident("base") {
                attrs.base = true;
            } else if meta.path.is_ident("identity") {
                attrs.identity = true;
            } else {
                return Err(meta.error("expected `skip`, `convert`, `base` or `identity`"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_struct_name(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    let mut name = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("persist") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Persistable cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Persistable requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Persistable can only be derived for structs",
            ));
        }
    };

    let persisted_name = match parse_struct_name(input)? {
        Some(lit) => quote! { #lit },
        None => quote! { ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#name)) },
    };

    let mut base: Option<(&syn::Ident, &Type)> = None;
    let mut identity: Option<&syn::Ident> = None;
    let mut infos = Vec::new();
    let mut field_arms = Vec::new();
    let mut field_mut_arms = Vec::new();

    for field in fields {
        let attrs = parse_field_attrs(field)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        if attrs.identity {
            if identity.replace(ident).is_some() {
                return Err(syn::Error::new_spanned(ident, "only one identity field is allowed"));
            }
            continue;
        }
        if attrs.base {
            if base.replace((ident, ty)).is_some() {
                return Err(syn::Error::new_spanned(ident, "only one base field is allowed"));
            }
            continue;
        }

        // Skip fields starting with `_` as well as explicitly excluded ones
        let ident_str = ident.to_string();
        if attrs.skip || ident_str.starts_with('_') {
            continue;
        }
        if !attrs.include && !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }

        infos.push(quote! {
            infos.push(::objgraph_codec::FieldInfo::of::<#ty>(#ident_str));
        });

        if attrs.convert {
            field_arms.push(quote! {
                #ident_str => ::core::option::Option::Some(
                    ::objgraph_codec::FieldRef::Opaque(&self.#ident as &dyn ::core::any::Any)
                )
            });
            field_mut_arms.push(quote! {
                #ident_str => ::core::option::Option::Some(
                    ::objgraph_codec::FieldMut::Opaque(&mut self.#ident as &mut dyn ::core::any::Any)
                )
            });
        } else {
            field_arms.push(quote! {
                #ident_str => ::core::option::Option::Some(
                    ::objgraph_codec::FieldRef::Codec(&self.#ident as &dyn ::objgraph_codec::Field)
                )
            });
            field_mut_arms.push(quote! {
                #ident_str => ::core::option::Option::Some(
                    ::objgraph_codec::FieldMut::Codec(&mut self.#ident as &mut dyn ::objgraph_codec::Field)
                )
            });
        }
    }

    let (base_infos, field_fallback, field_mut_fallback, base_handle) = match base {
        Some((ident, ty)) => (
            quote! {
                infos.extend_from_slice(
                    <#ty as ::objgraph_codec::Persistable>::persisted_fields(),
                );
            },
            quote! { _ => ::objgraph_codec::Persistable::field(&self.#ident, name) },
            quote! { _ => ::objgraph_codec::Persistable::field_mut(&mut self.#ident, name) },
            quote! { ::objgraph_codec::Persistable::live_handle(&self.#ident) },
        ),
        None => (
            quote! {},
            quote! { _ => ::core::option::Option::None },
            quote! { _ => ::core::option::Option::None },
            quote! { ::core::option::Option::None },
        ),
    };

    let live_handle = match identity {
        Some(ident) => quote! { self.#ident.or_else(|| #base_handle) },
        None => base_handle,
    };

    let expanded = quote! {
        impl ::objgraph_codec::Persistable for #name {
            fn type_name(&self) -> &'static str {
                <Self as ::objgraph_codec::Persistable>::persisted_name()
            }

            fn field_infos(&self) -> &'static [::objgraph_codec::FieldInfo] {
                <Self as ::objgraph_codec::Persistable>::persisted_fields()
            }

            #[allow(unused_variables)]
            fn field(&self, name: &str) -> ::core::option::Option<::objgraph_codec::FieldRef<'_>> {
                match name {
                    #(#field_arms,)*
                    #field_fallback,
                }
            }

            #[allow(unused_variables)]
            fn field_mut(&mut self, name: &str) -> ::core::option::Option<::objgraph_codec::FieldMut<'_>> {
                match name {
                    #(#field_mut_arms,)*
                    #field_mut_fallback,
                }
            }

            fn live_handle(&self) -> ::core::option::Option<::objgraph_codec::ObjectHandle> {
                #live_handle
            }

            fn persisted_name() -> &'static str {
                #persisted_name
            }

            fn persisted_fields() -> &'static [::objgraph_codec::FieldInfo] {
                static INFOS: ::std::sync::LazyLock<::std::vec::Vec<::objgraph_codec::FieldInfo>> =
                    ::std::sync::LazyLock::new(|| {
                        #[allow(unused_mut)]
                        let mut infos = ::std::vec::Vec::new();
                        #base_infos
                        #(#infos)*
                        ::objgraph_codec::FieldInfo::assert_unique(#persisted_name, &infos);
                        infos
                    });
                &INFOS
            }
        }

        impl ::objgraph_codec::Field for #name {
            fn serialize_field(
                &self,
                name: &str,
                output: &mut ::objgraph_codec::AccessorDictionary,
                ctx: &mut ::objgraph_codec::SerializationContext<'_>,
            ) {
                ::objgraph_codec::field::serialize_object_field(self, name, output, ctx)
            }

            fn deserialize_field(
                &mut self,
                name: &str,
                input: &::objgraph_codec::AccessorDictionary,
                ctx: &mut ::objgraph_codec::SerializationContext<'_>,
            ) {
                ::objgraph_codec::field::deserialize_object_field(self, name, input, ctx)
            }
        }
    };

    Ok(expanded)
}

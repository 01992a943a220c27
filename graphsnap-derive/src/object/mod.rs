// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

mod describe;
mod field_meta;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput};

pub fn derive_graph_object(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &ast.ident;
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "GraphObject cannot be derived for generic types",
        ));
    }
    let fields = match &ast.data {
        Data::Struct(s) => &s.fields,
        Data::Enum(_) | Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "GraphObject can only be derived for structs",
            ))
        }
    };

    let container = field_meta::parse_container_meta(&ast.attrs)?;
    let type_name = match &container.name {
        Some(lit) => quote! { #lit },
        None => {
            let ident = name.to_string();
            quote! { concat!(module_path!(), "::", #ident) }
        }
    };
    let body = describe::gen_describe(name, fields, &container)?;

    Ok(quote! {
        impl ::graphsnap_core::reflect::Reflect for #name {
            fn type_name() -> &'static str {
                #type_name
            }

            fn describe(schema: &mut ::graphsnap_core::reflect::SchemaBuilder<Self>) {
                #body
            }
        }
    })
}

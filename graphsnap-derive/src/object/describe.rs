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

use super::field_meta::{parse_field_meta, ContainerMeta};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{Fields, Index, Member};

/// Emits the statements of `Reflect::describe`.
pub fn gen_describe(
    name: &Ident,
    fields: &Fields,
    container: &ContainerMeta,
) -> syn::Result<TokenStream> {
    let mut field_ts = Vec::new();
    let mut base_ts = None;

    for (index, field) in fields.iter().enumerate() {
        let meta = parse_field_meta(field)?;
        let (member, field_name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
            None => (Member::Unnamed(Index::from(index)), index.to_string()),
        };

        if meta.skip {
            field_ts.push(quote! { schema.skip(#field_name); });
            continue;
        }

        if meta.base {
            if base_ts.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked `base`",
                ));
            }
            let ty = &field.ty;
            base_ts = Some(quote! {
                {
                    fn project(this: &#name) -> &#ty {
                        &this.#member
                    }
                    fn project_mut(this: &mut #name) -> &mut #ty {
                        &mut this.#member
                    }
                    schema.base::<#ty>(project, project_mut);
                }
            });
            continue;
        }

        field_ts.push(quote! {
            schema.field(
                #field_name,
                |this: &#name| ::graphsnap_core::value::ToValue::to_value(&this.#member),
                |this: &mut #name,
                 value: ::graphsnap_core::value::Value|
                 -> ::std::result::Result<(), ::graphsnap_core::error::Error> {
                    this.#member = ::graphsnap_core::value::FromValue::from_value(value)?;
                    ::std::result::Result::Ok(())
                },
            );
        });
    }

    let hook_ts = container
        .hooks
        .iter()
        .map(|hook| {
            let method: Ident = hook.parse()?;
            Ok(quote! {
                schema.hook(#hook, #name::#method);
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let keyed_ts = if container.keyed {
        quote! { schema.keyed(); }
    } else {
        quote! {}
    };

    Ok(quote! {
        #(#field_ts)*
        #base_ts
        #(#hook_ts)*
        #keyed_ts
    })
}

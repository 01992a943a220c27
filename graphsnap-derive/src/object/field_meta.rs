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

//! Parsing of `#[graph(...)]` attributes.

use syn::{Attribute, Field, LitStr};

/// Container-level `#[graph(...)]` attributes.
#[derive(Default)]
pub struct ContainerMeta {
    pub name: Option<LitStr>,
    pub hooks: Vec<LitStr>,
    pub keyed: bool,
}

/// Field-level `#[graph(...)]` attributes.
#[derive(Default)]
pub struct FieldMeta {
    pub skip: bool,
    pub base: bool,
}

pub fn parse_container_meta(attrs: &[Attribute]) -> syn::Result<ContainerMeta> {
    let mut meta = ContainerMeta::default();
    for attr in attrs {
        if !attr.path().is_ident("graph") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("name") {
                if meta.name.is_some() {
                    return Err(nested.error("duplicate `name`"));
                }
                meta.name = Some(nested.value()?.parse()?);
            } else if nested.path.is_ident("hook") {
                let hook: LitStr = nested.value()?.parse()?;
                if hook.value().is_empty() {
                    return Err(syn::Error::new(hook.span(), "hook method name is empty"));
                }
                meta.hooks.push(hook);
            } else if nested.path.is_ident("keyed") {
                meta.keyed = true;
            } else {
                return Err(nested.error("expected `name`, `hook` or `keyed`"));
            }
            Ok(())
        })?;
    }
    Ok(meta)
}

pub fn parse_field_meta(field: &Field) -> syn::Result<FieldMeta> {
    let mut meta = FieldMeta::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("graph") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("skip") {
                meta.skip = true;
            } else if nested.path.is_ident("base") {
                meta.base = true;
            } else {
                return Err(nested.error("expected `skip` or `base`"));
            }
            Ok(())
        })?;
    }
    if meta.skip && meta.base {
        return Err(syn::Error::new_spanned(
            field,
            "a field cannot be both `skip` and `base`",
        ));
    }
    Ok(meta)
}

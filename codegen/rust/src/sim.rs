// Copyright 2024 Oxide Computer Company

use p4_cg::layout::Field;
use p4_cg::naming::{sim_read_fn, sim_write_fn, upper_case};
use p4_cg::LoweredTable;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

/// Values up to this many bits cross the simulator boundary as `u64`.
const NARROW: usize = 64;

pub(crate) struct SimGenerator<'a> {
    table: &'a LoweredTable,
    store: Ident,
    shape: Ident,
}

impl<'a> SimGenerator<'a> {
    pub(crate) fn new(table: &'a LoweredTable) -> Self {
        let prefix = upper_case(table.name());
        Self {
            table,
            store: format_ident!("{}_MATCHTABLE", prefix),
            shape: format_ident!("{}_SHAPE", prefix),
        }
    }

    pub(crate) fn store(&self) -> &Ident {
        &self.store
    }

    pub(crate) fn shape(&self) -> &Ident {
        &self.shape
    }

    pub(crate) fn generate(&self) -> TokenStream {
        let store = &self.store;
        let kw = self.table.layout.request.width();
        let rw = self.table.layout.response.width();
        let shape = self.generate_shape();
        let read = self.generate_read();
        let write = self.generate_write();
        quote! {
            pub static #store: p4rs::table::SharedMatchTable =
                p4rs::table::SharedMatchTable::new(#kw, #rw);

            #shape
            #read
            #write
        }
    }

    fn generate_shape(&self) -> TokenStream {
        let d = &self.table.descriptor;
        let layout = &self.table.layout;
        let shape = &self.shape;

        let name = d.name();
        let id = d.id();
        let capacity = d.capacity();
        let padding = layout.request.padding;
        let tag_width = layout.response.tag_width;
        let key = fields(&layout.request.key);
        let parameters = fields(&layout.response.parameters);
        let actions = d.actions().iter().map(|a| {
            let name = &a.name;
            let params = a.parameters.iter().map(|p| {
                let (n, w) = (&p.name, p.width);
                quote! { p4rs::FieldShape { name: #n, width: #w } }
            });
            quote! {
                p4rs::ActionShape { name: #name, parameters: &[#(#params),*] }
            }
        });
        let default_action = match d.default_action() {
            Some(a) if d.ordinal(a).is_some() => quote! { Some(#a) },
            _ => quote! { None },
        };

        quote! {
            pub const #shape: p4rs::TableShape = p4rs::TableShape {
                name: #name,
                id: #id,
                capacity: #capacity,
                padding: #padding,
                key: &[#(#key),*],
                tag_width: #tag_width,
                parameters: &[#(#parameters),*],
                actions: &[#(#actions),*],
                default_action: #default_action,
            };
        }
    }

    fn generate_read(&self) -> TokenStream {
        let store = &self.store;
        let name = format_ident!("{}", sim_read_fn(self.table.name()));
        let kw = self.table.layout.request.width();
        let rw = self.table.layout.response.width();
        let key_words = words(kw);
        let rsp_words = words(rw);

        match (kw > NARROW, rw > NARROW) {
            (false, false) => quote! {
                #[no_mangle]
                #[allow(non_snake_case)]
                pub extern "C" fn #name(key: u64) -> u64 {
                    #store.read_u64(key)
                }
            },
            (true, false) => quote! {
                #[no_mangle]
                #[allow(non_snake_case, clippy::missing_safety_doc)]
                pub unsafe extern "C" fn #name(key: *const u32) -> u64 {
                    let key = std::slice::from_raw_parts(key, #key_words);
                    let mut rsp = [0u32; 2];
                    #store.read_words(key, &mut rsp);
                    (rsp[0] as u64) | ((rsp[1] as u64) << 32)
                }
            },
            (false, true) => quote! {
                #[no_mangle]
                #[allow(non_snake_case, clippy::missing_safety_doc)]
                pub unsafe extern "C" fn #name(out: *mut u32, key: u64) {
                    let key = [key as u32, (key >> 32) as u32];
                    let out = std::slice::from_raw_parts_mut(out, #rsp_words);
                    #store.read_words(&key, out);
                }
            },
            (true, true) => quote! {
                #[no_mangle]
                #[allow(non_snake_case, clippy::missing_safety_doc)]
                pub unsafe extern "C" fn #name(out: *mut u32, key: *const u32) {
                    let key = std::slice::from_raw_parts(key, #key_words);
                    let out = std::slice::from_raw_parts_mut(out, #rsp_words);
                    #store.read_words(key, out);
                }
            },
        }
    }

    fn generate_write(&self) -> TokenStream {
        let store = &self.store;
        let name = format_ident!("{}", sim_write_fn(self.table.name()));
        let kw = self.table.layout.request.width();
        let rw = self.table.layout.response.width();

        if kw <= NARROW && rw <= NARROW {
            return quote! {
                #[no_mangle]
                #[allow(non_snake_case)]
                pub extern "C" fn #name(key: u64, data: u64) {
                    #store.write_u64(key, data)
                }
            };
        }

        let (key_ty, key_words) = boundary_words(quote! { key }, kw);
        let (data_ty, data_words) = boundary_words(quote! { data }, rw);
        quote! {
            #[no_mangle]
            #[allow(non_snake_case, clippy::missing_safety_doc)]
            pub unsafe extern "C" fn #name(key: #key_ty, data: #data_ty) {
                let key = #key_words;
                let data = #data_words;
                #store.write_words(&key, &data);
            }
        }
    }
}

fn fields(fields: &[Field]) -> Vec<TokenStream> {
    fields
        .iter()
        .map(|f| {
            let (n, w) = (&f.name, f.width);
            quote! { p4rs::FieldShape { name: #n, width: #w } }
        })
        .collect()
}

fn words(width: usize) -> usize {
    width.div_ceil(32)
}

/// Parameter type of a value crossing the simulator boundary and the
/// expression turning it into an owned word vector.
fn boundary_words(
    arg: TokenStream,
    width: usize,
) -> (TokenStream, TokenStream) {
    if width <= NARROW {
        (
            quote! { u64 },
            quote! { vec![#arg as u32, (#arg >> 32) as u32] },
        )
    } else {
        let words = words(width);
        (
            quote! { *const u32 },
            quote! { std::slice::from_raw_parts(#arg, #words).to_vec() },
        )
    }
}

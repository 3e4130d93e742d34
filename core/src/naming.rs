//! Flat component identifiers derived from type paths.
//!
//! Applications that keep shared clients in a registry key them by a flat
//! name: `my_app::clients::Billing` becomes `my_app_clients_Billing`.

/// Replace every `::` path separator in `type_path` with `_`.
pub fn component_name(type_path: &str) -> String {
    type_path.replace("::", "_")
}

/// Component identifier for `T`.
pub fn component_name_of<T: ?Sized>() -> String {
    component_name(std::any::type_name::<T>())
}

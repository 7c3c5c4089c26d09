//! Macros for declaring state enums.

/// Generate a [`State`](crate::core::State) implementation for a simple enum.
///
/// Variants map to their own name unless a symbolic label is given.
///
/// # Example
///
/// ```
/// use statefield::core::State;
/// use statefield::state_enum;
///
/// state_enum! {
///     pub enum OrderStatus {
///         Pending => "pending",
///         Processing => "processing",
///         Completed => "completed",
///     }
/// }
///
/// assert_eq!(OrderStatus::Pending.name(), "pending");
/// assert_eq!(OrderStatus::parse("completed"), Some(OrderStatus::Completed));
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(=> $label:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $crate::__state_label!($variant $(, $label)?)),*
                }
            }

            fn variants() -> ::std::vec::Vec<Self> {
                ::std::vec![$(Self::$variant),*]
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __state_label {
    ($variant:ident) => {
        stringify!($variant)
    };
    ($variant:ident, $label:literal) => {
        $label
    };
}

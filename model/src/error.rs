use snafu::Snafu;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Size '{}' is empty", what))]
    EmptySize { what: String },

    #[snafu(display("Size '{}' has an unknown suffix '{}'", value, suffix))]
    UnknownSizeSuffix { value: String, suffix: String },

    #[snafu(display("Size '{}' is not a valid {}", value, what))]
    InvalidSize { value: String, what: String },

    #[snafu(display("Size '{}' overflows a {}", value, what))]
    SizeOverflow { value: String, what: String },
}

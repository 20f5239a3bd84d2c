use crate::constants::MAX_CONTAINER_NAME_LENGTH;
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

lazy_static! {
    static ref DNS_1123_LABEL: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap()
    };
}

/// Appends `length` random lowercase alphanumeric characters to `prefix`.
pub fn generate<S: AsRef<str>>(prefix: S, length: usize) -> String {
    let mut name = prefix.as_ref().to_string();
    while name.len() < prefix.as_ref().len() + length {
        let remaining = prefix.as_ref().len() + length - name.len();
        name.extend(Uuid::new_v4().simple().to_string().chars().take(remaining));
    }
    name
}

/// The name under which a container's machine is registered in the environment.
pub fn machine_name<S1, S2>(pod_name: S1, container_name: S2) -> String
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    format!("{}/{}", pod_name.as_ref(), container_name.as_ref())
}

/// Whether `name` can be used as a container name, i.e. it is a DNS-1123 label of at most
/// `MAX_CONTAINER_NAME_LENGTH` characters.
pub fn is_valid_container_name(name: &str) -> bool {
    name.len() <= MAX_CONTAINER_NAME_LENGTH && DNS_1123_LABEL.is_match(name)
}

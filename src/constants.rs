//! Default locations and tokens used when reading selector configuration.

/// Default path of the certificate selector configuration file.
///
/// Each line is `TAG1|TAG2,label,type,uri,credential-ref`: up to ten group
/// tags, then a label, a certificate type, the certificate URI and the
/// credential reference. See [`CertSelector`](crate::CertSelector).
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ssl/certsel/certsel.cfg";

/// Default path of the properties file that names the hardware root-of-trust engine.
pub const DEFAULT_PROPERTIES_PATH: &str = "/etc/ssl/certsel/hrot.properties";

/// Key prefix of the engine entry in the properties file.
pub const ENGINE_KEY: &str = "hrotengine=";

/// Separator between the fields of a configuration line.
pub const FIELD_DELIMITER: char = ',';

/// Separator between the group tags in the first field of a configuration line.
pub const GROUP_DELIMITER: char = '|';

/// URI scheme prefix stripped from a certificate URI to obtain its filesystem path.
pub const FILE_SCHEME: &str = "file://";

mod common;

use certselector::{CertLocator, CertSelectorError, ErrorKind, FieldKind};
use common::{Fixture, ENGINE, FIRST, SECOND, THIRD};

#[test]
fn test_new() {
    let fx = Fixture::new();
    let locator = fx.locator();
    assert_eq!(locator.engine(), Some(ENGINE));

    let err = CertLocator::new(fx.path().join("missing.cfg"), &fx.properties).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);

    let err = CertLocator::new("", &fx.properties).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadArgument);

    let err = CertLocator::new(fx.path().join("c".repeat(130)), &fx.properties).unwrap_err();
    assert!(matches!(
        err,
        CertSelectorError::TooLong {
            field: FieldKind::ConfigPath,
            ..
        }
    ));
}

#[test]
fn test_locate_cert() {
    let fx = Fixture::new();
    let mut locator = fx.locator();

    for (label, name, passcode) in [
        ("FRST", FIRST, &b"pc1pass"[..]),
        ("SCND", SECOND, &b"pc2pass"[..]),
        ("THRD", THIRD, &b"pc3pass"[..]),
    ] {
        let creds = locator.locate_cert(label).unwrap();
        assert_eq!(creds.uri(), fx.uri(name));
        assert_eq!(creds.passcode().as_bytes(), passcode);
    }
}

#[test]
fn test_locate_cert_rejects_invalid_label() {
    let fx = Fixture::new();
    let mut locator = fx.locator();

    let long = "L".repeat(64);
    for label in ["", "FRST,SCND", long.as_str()] {
        let err = locator.locate_cert(label).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadArgument, "label {label:?}");
    }
}

#[test]
fn test_locate_cert_failures() {
    let fx = Fixture::new();
    let mut locator = fx.locator();

    let err = locator.locate_cert("NONE").unwrap_err();
    assert!(matches!(err, CertSelectorError::LabelNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::FileNotFound);

    // Group tags are not labels.
    let err = locator.locate_cert("GRP1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);

    let err = locator.locate_cert("NOPC").unwrap_err();
    assert!(matches!(err, CertSelectorError::CredentialUnavailable { .. }));
    assert_eq!(err.kind(), ErrorKind::FileError);

    fx.remove(THIRD);
    let err = locator.locate_cert("THRD").unwrap_err();
    assert!(matches!(err, CertSelectorError::CertFileMissing { .. }));
    assert_eq!(err.kind(), ErrorKind::FileNotFound);

    fx.write_config("X,THRD,P12\n");
    let err = locator.locate_cert("THRD").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileError);
}

#[test]
fn test_destroy() {
    let fx = Fixture::new();
    let mut locator = fx.locator();
    assert!(locator.locate_cert("FRST").is_ok());

    locator.destroy();
    locator.destroy();
    assert_eq!(locator.engine(), None);
    let err = locator.locate_cert("FRST").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadPointer);
}

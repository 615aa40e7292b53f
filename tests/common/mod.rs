#![allow(dead_code)]

use certselector::{CertLocator, CertSelector, ResolveError};
use std::cell::Cell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use zeroize::Zeroizing;

pub const FIRST: &str = "tst1first.tmp";
pub const SECOND: &str = "tst1second.tmp";
pub const THIRD: &str = "tst1third.tmp";
pub const ALPHA: &str = "tst1alpha.tmp";

pub const ENGINE: &str = "e4tstengine";

/// Outcome code of a local certificate problem.
pub const CERT_PROBLEM: u32 = 58;
/// Outcome code unrelated to the certificate.
pub const UNSUPPORTED_PROTOCOL: u32 = 1;

const BASE_MTIME: u64 = 1_700_000_000;

/// In-memory credential store used by every test.
pub fn credentials(reference: &str) -> Result<Zeroizing<Vec<u8>>, ResolveError> {
    let value: &[u8] = match reference {
        "pc1" => b"pc1pass",
        "pc2" => b"pc2pass\n",
        "pc3" => b"pc3pass",
        "pcalpha" => b"pcalphapass",
        _ => {
            return Err(ResolveError::NotFound {
                reference: reference.to_owned(),
            })
        }
    };
    Ok(Zeroizing::new(value.to_vec()))
}

/// A temporary directory holding certificate files, a configuration file and
/// an engine properties file.
pub struct Fixture {
    dir: TempDir,
    pub config: PathBuf,
    pub properties: PathBuf,
    clock: Cell<u64>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("certsel.cfg");
        let properties = dir.path().join("hrot.properties");
        let fixture = Self {
            dir,
            config,
            properties,
            clock: Cell::new(BASE_MTIME),
        };

        for name in [FIRST, SECOND, THIRD, ALPHA] {
            fixture.restore(name);
        }
        fixture.write_config(&fixture.default_config());
        fs::write(
            &fixture.properties,
            format!("# engine selection\nhrotengine={ENGINE}\n"),
        )
        .unwrap();
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn uri(&self, name: &str) -> String {
        format!("file://{}", self.cert(name).display())
    }

    pub fn cert(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn default_config(&self) -> String {
        format!(
            "\
GRP1,FRST,P12,{first},pc1
GRP1,SCND,P12,{second},pc2
GRP1|GRP3,THRD,P12,{third},pc3
A1|A2|A3|A4|A5|A6|A7|A8|A9|A10,ALPH,P12,{alpha},pcalpha
GRP10,NOPC,P12,{first},pcmissing
GRP10,BETA,P12,{second},pc2
",
            first = self.uri(FIRST),
            second = self.uri(SECOND),
            third = self.uri(THIRD),
            alpha = self.uri(ALPHA),
        )
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(&self.config, contents).unwrap();
    }

    /// (Re)creates a certificate file with the base modification time.
    pub fn restore(&self, name: &str) {
        let path = self.cert(name);
        fs::write(&path, b"certificate").unwrap();
        set_mtime(&path, BASE_MTIME);
    }

    pub fn remove(&self, name: &str) {
        fs::remove_file(self.cert(name)).unwrap();
    }

    /// Gives a certificate file a modification time it never had before.
    pub fn touch(&self, name: &str) {
        let next = self.clock.get() + 60;
        self.clock.set(next);
        set_mtime(&self.cert(name), next);
    }

    pub fn selector(&self, group: &str) -> CertSelector {
        CertSelector::builder()
            .group(group)
            .config_path(&self.config)
            .properties_path(&self.properties)
            .secret_resolver(credentials)
            .build()
            .unwrap()
    }

    pub fn locator(&self) -> CertLocator {
        CertLocator::with_resolver(&self.config, &self.properties, credentials).unwrap()
    }
}

fn set_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::*;
use crate::settings::{EnvParams, LayoutParams};

use super::{PathType, ResourceManager, FILE_PROTOCOL};

/// `ResourceManager` backed by plain directories on the local host filesystem.
///
/// An asset must be shipped with the application to be resolvable at all. If a patched
/// copy has been placed into the persistent storage, that copy wins and the path is
/// classified as `PathType::External`.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    app_dir: PathBuf,
    bundles_dir: String,
    bundles_path: PathBuf,
    patches_path: PathBuf,
}

impl DirectoryLayout {
    pub fn new(params: &LayoutParams, env: EnvParams) -> Result<Self> {
        if !params.bundles_dir.is_empty() && !params.bundles_dir.ends_with('/') {
            return Err(Error::Malformed(format!(
                "Bundles directory {:?} must end in a '/'.",
                params.bundles_dir
            )));
        }

        let root = if env.editor {
            &params.editor_dir
        } else {
            &params.app_dir
        };

        let metadata = fs::metadata(root).map_err(|err| Error::storage(root.display(), err))?;
        if !metadata.is_dir() {
            return Err(Error::Malformed(format!(
                "{:?} is not a decent directory.",
                root
            )));
        }

        info!(
            "Creates directory layout with bundles at {:?}.",
            root.join(&params.bundles_dir)
        );

        Ok(DirectoryLayout {
            app_dir: params.app_dir.clone(),
            bundles_dir: params.bundles_dir.clone(),
            bundles_path: root.join(&params.bundles_dir),
            patches_path: params.persistent_dir.join(&params.bundles_dir),
        })
    }

    /// Returns the path a patched copy of `path` would be placed at.
    #[inline]
    pub fn patch_path<T: AsRef<str>>(&self, path: T) -> PathBuf {
        self.patches_path.join(path.as_ref())
    }
}

impl ResourceManager for DirectoryLayout {
    fn full_path(&self, path: &str, allow_network: bool) -> (PathType, String) {
        if !is_relative_path(path) {
            return (PathType::Invalid, String::new());
        }

        let in_app = self.bundles_path.join(path);
        if !in_app.is_file() {
            return (PathType::Invalid, String::new());
        }

        let patched = self.patches_path.join(path);
        let (kind, location) = if patched.is_file() {
            (PathType::External, patched)
        } else {
            (PathType::InApp, in_app)
        };

        let location = location.to_string_lossy();
        if allow_network {
            (kind, format!("{}{}", FILE_PROTOCOL, location))
        } else {
            (kind, location.into_owned())
        }
    }

    fn load_sync_from_streaming_assets(&self, relative: &str) -> Result<Vec<u8>> {
        let location = self.app_dir.join(relative);
        fs::read(&location).map_err(|err| Error::storage(location.display(), err))
    }

    #[inline]
    fn bundles_path_relative(&self) -> &str {
        &self.bundles_dir
    }

    #[inline]
    fn bundles_path_without_file_protocol(&self) -> &Path {
        &self.bundles_path
    }
}

/// Returns true if `path` is non-empty and stays inside the directory it is joined to.
fn is_relative_path(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path).components().all(|v| match v {
            Component::Normal(_) | Component::CurDir => true,
            _ => false,
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::env;
    use std::process;

    fn testbed(name: &str) -> LayoutParams {
        let root = env::temp_dir().join(format!("hotbytes-layout-{}-{}", name, process::id()));
        let _ = fs::remove_dir_all(&root);

        let params = LayoutParams {
            app_dir: root.join("app"),
            persistent_dir: root.join("persistent"),
            editor_dir: root.join("product"),
            bundles_dir: "Bundles/".into(),
        };

        fs::create_dir_all(params.app_dir.join("Bundles/patch")).unwrap();
        fs::create_dir_all(params.persistent_dir.join("Bundles/patch")).unwrap();
        fs::create_dir_all(params.editor_dir.join("Bundles")).unwrap();

        fs::write(params.app_dir.join("Bundles/config.json"), b"{}").unwrap();
        fs::write(params.app_dir.join("Bundles/patch/update.bin"), b"old").unwrap();
        fs::write(params.persistent_dir.join("Bundles/patch/update.bin"), b"new").unwrap();
        fs::write(params.persistent_dir.join("Bundles/patch/orphan.bin"), b"?").unwrap();
        params
    }

    #[test]
    fn classify() {
        let params = testbed("classify");
        let layout = DirectoryLayout::new(&params, EnvParams::default()).unwrap();

        let (kind, location) = layout.full_path("config.json", false);
        assert_eq!(kind, PathType::InApp);
        assert_eq!(Path::new(&location), params.app_dir.join("Bundles/config.json"));

        let (kind, location) = layout.full_path("patch/update.bin", false);
        assert_eq!(kind, PathType::External);
        assert_eq!(Path::new(&location), layout.patch_path("patch/update.bin"));

        let (kind, location) = layout.full_path("patch/update.bin", true);
        assert_eq!(kind, PathType::External);
        assert!(location.starts_with(FILE_PROTOCOL));

        assert_eq!(layout.full_path("missing/x.bin", false).0, PathType::Invalid);
        assert_eq!(layout.full_path("patch/orphan.bin", false).0, PathType::Invalid);
        assert_eq!(layout.full_path("", true).0, PathType::Invalid);
        assert_eq!(layout.full_path("patch", false).0, PathType::Invalid);
    }

    #[test]
    fn escape() {
        let params = testbed("escape");
        let layout = DirectoryLayout::new(&params, EnvParams::default()).unwrap();
        fs::write(params.app_dir.join("secret.txt"), b"secret").unwrap();

        assert!(params.app_dir.join("Bundles/../secret.txt").is_file());
        for path in &[
            "../secret.txt",
            "patch/../../secret.txt",
            "patch/../config.json",
            "/etc/hosts",
        ] {
            assert_eq!(layout.full_path(path, false).0, PathType::Invalid, "{}", path);
            assert_eq!(layout.full_path(path, true).0, PathType::Invalid, "{}", path);
        }

        assert_eq!(layout.full_path("./config.json", false).0, PathType::InApp);
    }

    #[test]
    fn streaming_assets() {
        let params = testbed("streaming_assets");
        let layout = DirectoryLayout::new(&params, EnvParams::default()).unwrap();

        let relative = format!("{}{}", layout.bundles_path_relative(), "config.json");
        assert_eq!(layout.load_sync_from_streaming_assets(&relative).unwrap(), b"{}");
        assert!(layout.load_sync_from_streaming_assets("Bundles/nope").is_err());
        assert!(layout.bundles_path().starts_with(FILE_PROTOCOL));
    }

    #[test]
    fn editor() {
        let params = testbed("editor");
        let env = EnvParams {
            editor: true,
            debug: false,
        };

        let layout = DirectoryLayout::new(&params, env).unwrap();
        assert_eq!(
            layout.bundles_path_without_file_protocol(),
            params.editor_dir.join("Bundles/").as_path()
        );

        assert_eq!(layout.full_path("config.json", false).0, PathType::Invalid);
        fs::write(params.editor_dir.join("Bundles/config.json"), b"{}").unwrap();
        assert_eq!(layout.full_path("config.json", false).0, PathType::InApp);
    }

    #[test]
    fn malformed() {
        let mut params = testbed("malformed");
        params.bundles_dir = "Bundles".into();
        assert!(DirectoryLayout::new(&params, EnvParams::default()).is_err());

        params.bundles_dir = "Bundles/".into();
        params.app_dir = params.app_dir.join("_invalid_path_");
        assert!(DirectoryLayout::new(&params, EnvParams::default()).is_err());
    }
}

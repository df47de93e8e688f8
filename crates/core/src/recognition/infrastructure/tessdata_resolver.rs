use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{TESSDATA_EXTENSION, TESSDATA_URL_TEMPLATE};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create tessdata directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download failed for {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to write language data to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("language data for '{language}' not found in {dir}")]
    Missing { language: String, dir: PathBuf },
}

/// Progress callback: `(language, bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(&str, u64, u64) + Send>;

/// Returns the file name Tesseract expects for a language code.
pub fn traineddata_file_name(language: &str) -> String {
    format!("{language}.{TESSDATA_EXTENSION}")
}

/// Verifies every language has a traineddata file in `dir`.
pub fn verify(dir: &Path, languages: &[String]) -> Result<(), ModelResolveError> {
    match languages
        .iter()
        .find(|lang| !dir.join(traineddata_file_name(lang)).exists())
    {
        Some(language) => Err(ModelResolveError::Missing {
            language: language.clone(),
            dir: dir.to_path_buf(),
        }),
        None => Ok(()),
    }
}

/// Resolves a tessdata directory holding every requested language,
/// downloading missing files into the user cache.
pub fn resolve(
    languages: &[String],
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let dir = tessdata_cache_dir()?;
    resolve_into(&dir, languages, TESSDATA_URL_TEMPLATE, progress)?;
    Ok(dir)
}

/// Ensures `dir` contains `<lang>.traineddata` for each language.
///
/// Existing files are left untouched; missing ones are fetched from
/// `url_template` with `{}` replaced by the language code.
pub fn resolve_into(
    dir: &Path,
    languages: &[String],
    url_template: &str,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    fs::create_dir_all(dir).map_err(ModelResolveError::CacheDir)?;

    for language in languages {
        let dest = dir.join(traineddata_file_name(language));
        if dest.exists() {
            log::debug!("Language data present: {}", dest.display());
            continue;
        }

        let url = url_template.replace("{}", language);
        log::info!("Downloading language data for '{language}' from {url}");
        download(&url, &dest, |downloaded, total| {
            if let Some(ref cb) = progress {
                cb(language, downloaded, total);
            }
        })?;
    }

    Ok(())
}

/// Platform-specific tessdata cache directory.
///
/// - macOS: `~/Library/Application Support/Subtitle OCR/tessdata/`
/// - Linux: `$XDG_CACHE_HOME/Subtitle OCR/tessdata/` or `~/.cache/Subtitle OCR/tessdata/`
/// - Windows: `%LOCALAPPDATA%/Subtitle OCR/tessdata/`
pub fn tessdata_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Subtitle OCR").join("tessdata"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Subtitle OCR").join("tessdata"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(
    url: &str,
    dest: &Path,
    progress: impl Fn(u64, u64),
) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url).map_err(|e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;

    if !response.status().is_success() {
        return Err(ModelResolveError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(|e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let write_err = |e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(write_err)?;
        downloaded += chunk.len() as u64;
        progress(downloaded, total);
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_traineddata_file_name() {
        assert_eq!(traineddata_file_name("chi_sim"), "chi_sim.traineddata");
    }

    #[test]
    fn test_verify_all_present() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("eng.traineddata"), b"x").unwrap();
        fs::write(tmp.path().join("chi_sim.traineddata"), b"x").unwrap();
        assert!(verify(tmp.path(), &langs(&["chi_sim", "eng"])).is_ok());
    }

    #[test]
    fn test_verify_reports_first_missing_language() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("eng.traineddata"), b"x").unwrap();
        let err = verify(tmp.path(), &langs(&["eng", "jpn"])).unwrap_err();
        match err {
            ModelResolveError::Missing { language, .. } => assert_eq!(language, "jpn"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_into_skips_existing_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("eng.traineddata"), b"cached").unwrap();

        // An unreachable URL proves no download is attempted.
        resolve_into(
            tmp.path(),
            &langs(&["eng"]),
            "http://invalid.nonexistent.example.com/{}.traineddata",
            None,
        )
        .unwrap();
        assert_eq!(
            fs::read(tmp.path().join("eng.traineddata")).unwrap(),
            b"cached"
        );
    }

    #[test]
    fn test_resolve_into_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("tessdata");
        resolve_into(&dir, &[], TESSDATA_URL_TEMPLATE, None).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_resolve_into_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_into(
            tmp.path(),
            &langs(&["eng"]),
            "http://invalid.nonexistent.example.com/{}.traineddata",
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("eng.traineddata");
        let _ = download(
            "http://invalid.nonexistent.example.com/eng.traineddata",
            &dest,
            |_, _| {},
        );
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_tessdata_cache_dir_returns_path() {
        let path = tessdata_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Subtitle OCR"));
        assert!(path.ends_with("tessdata"));
    }
}

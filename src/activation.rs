//! Link activation - open the resource behind a clicked keyword

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::error::{NavigatorError, Result};
use crate::links::LinkDictionary;

/// Opens external resources with whatever the platform associates with them
pub trait Opener {
    /// Start opening `target`; must not wait for the viewer to exit
    fn open(&self, target: &Path) -> std::io::Result<()>;
}

/// Opens files through the desktop's default handler
#[derive(Debug, Default)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, target: &Path) -> std::io::Result<()> {
        #[cfg(windows)]
        let mut command = {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]).arg(target);
            c
        };

        #[cfg(target_os = "macos")]
        let mut command = {
            let mut c = Command::new("open");
            c.arg(target);
            c
        };

        #[cfg(all(unix, not(target_os = "macos")))]
        let mut command = {
            let mut c = Command::new("xdg-open");
            c.arg(target);
            c
        };

        // The viewer would otherwise draw over the terminal UI
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

/// Resolves keywords and hands their resources to an opener
pub struct ActivationHandler {
    links: Arc<LinkDictionary>,
    /// Directory relative resources are resolved against
    resource_dir: PathBuf,
    opener: Box<dyn Opener>,
}

impl ActivationHandler {
    pub fn new(links: Arc<LinkDictionary>, resource_dir: PathBuf, opener: Box<dyn Opener>) -> Self {
        Self {
            links,
            resource_dir,
            opener,
        }
    }

    /// Path a keyword's resource lives at, if the keyword is known
    pub fn resolve(&self, keyword: &str) -> Option<PathBuf> {
        self.links
            .resolve(keyword)
            .map(|resource| self.resource_dir.join(resource))
    }

    /// Open the resource behind `keyword`
    ///
    /// Returns the opened path. Unknown keywords, missing files and opener
    /// failures are all `ResourceUnreachable`.
    pub fn activate(&self, keyword: &str) -> Result<PathBuf> {
        let unreachable = |reason: String| NavigatorError::ResourceUnreachable {
            keyword: keyword.to_string(),
            reason,
        };

        let path = self
            .resolve(keyword)
            .ok_or_else(|| unreachable("no linked resource".to_string()))?;

        if !path.exists() {
            return Err(unreachable(format!("{} not found", path.display())));
        }

        self.opener
            .open(&path)
            .map_err(|e| unreachable(e.to_string()))?;

        log::info!("opened {} for {}", path.display(), keyword);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    use crate::links::LinkEntry;

    /// Records every open request
    #[derive(Clone, Default)]
    struct RecordingOpener {
        opened: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl Opener for RecordingOpener {
        fn open(&self, target: &Path) -> std::io::Result<()> {
            self.opened.borrow_mut().push(target.to_path_buf());
            Ok(())
        }
    }

    struct FailingOpener;

    impl Opener for FailingOpener {
        fn open(&self, _target: &Path) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no handler"))
        }
    }

    fn links() -> Arc<LinkDictionary> {
        Arc::new(LinkDictionary::new(vec![LinkEntry::new("Annexure-4", "Annexure 4.pdf")]).unwrap())
    }

    #[test]
    fn test_opens_existing_resource() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Annexure 4.pdf"), b"%PDF").unwrap();

        let opener = RecordingOpener::default();
        let handler = ActivationHandler::new(links(), dir.path().to_path_buf(), Box::new(opener.clone()));

        let opened = handler.activate("Annexure-4").unwrap();
        assert_eq!(opened, dir.path().join("Annexure 4.pdf"));
        assert_eq!(*opener.opened.borrow(), vec![dir.path().join("Annexure 4.pdf")]);
    }

    #[test]
    fn test_missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let opener = RecordingOpener::default();
        let handler = ActivationHandler::new(links(), dir.path().to_path_buf(), Box::new(opener.clone()));

        let result = handler.activate("Annexure-4");
        assert!(matches!(result, Err(NavigatorError::ResourceUnreachable { .. })));
        assert!(opener.opened.borrow().is_empty());
    }

    #[test]
    fn test_unknown_keyword_is_unreachable() {
        let opener = RecordingOpener::default();
        let handler = ActivationHandler::new(links(), PathBuf::from("."), Box::new(opener.clone()));

        let result = handler.activate("Annexure-99");
        assert!(matches!(result, Err(NavigatorError::ResourceUnreachable { .. })));
        assert!(opener.opened.borrow().is_empty());
    }

    #[test]
    fn test_opener_failure_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Annexure 4.pdf"), b"%PDF").unwrap();
        let handler = ActivationHandler::new(links(), dir.path().to_path_buf(), Box::new(FailingOpener));

        let err = handler.activate("Annexure-4").unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Cannot open 'Annexure-4': no handler");
    }
}

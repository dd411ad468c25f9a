use std::path::Path;

use tracing::{debug, warn};

use crate::{api::ModRepository, error::ModgetError, model::ModFile};

/// Install `file` and, transitively, the newest compatible build of every
/// required dependency into `mods_dir`
///
/// Dependencies are installed before the file that needs them. Each group of
/// candidate builds is filtered to those supporting `game_version` and the
/// most recently uploaded survivor wins; a group with no survivor is skipped.
/// A failing dependency branch is logged and does not abort its siblings or
/// the parent, so one broken dependency still leaves you with everything
/// else.
///
/// Returns the names of the files that were written, dependencies first.
///
/// The dependency graph is assumed to be finite and acyclic, which holds for
/// the addon API this crate talks to. There is no cycle detection.
///
/// # Params
/// * repo - client for the mod repository
/// * file - build to install; `None` is a no-op
/// * game_version - Minecraft version to filter dependency candidates by
/// * mods_dir - existing directory to download into
///
/// # Errors
/// * `DownloadError` if the transfer of `file` itself fails
pub fn install_file<R: ModRepository>(
    repo: &R,
    file: Option<&ModFile>,
    game_version: &str,
    mods_dir: impl AsRef<Path>,
) -> Result<Vec<String>, ModgetError> {
    let Some(file) = file else {
        return Ok(vec![]);
    };
    let mods_dir = mods_dir.as_ref();
    let name = file.file_name();
    let mut installed = vec![];

    match repo.dependency_groups(file) {
        Ok(groups) => {
            for group in groups {
                let pick = group
                    .iter()
                    .filter(|f| f.supports(game_version))
                    .max_by_key(|f| f.uploaded);

                match install_file(repo, pick, game_version, mods_dir) {
                    Ok(mut deps) => installed.append(&mut deps),
                    Err(e) => warn!("Skipping dependency of {}: {}", name, e),
                }
            }
        }
        Err(e) => warn!("{}", ModgetError::dep(name, e)),
    }

    debug!("Installing {} to {}", name, mods_dir.display());
    repo.download_to(&file.download_url, &mods_dir.join(name))?;
    debug!("{} successfully installed", name);
    installed.push(name.to_string());

    Ok(installed)
}

#[cfg(test)]
mod test {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use mockall::Sequence;
    use tracing_test::traced_test;

    use super::install_file;
    use crate::api::MockModRepository;
    use crate::error::ModgetError;
    use crate::model::{DependencyKind, FileDependency, ModFile};

    fn file(name: &str, versions: &[&str], uploaded: i64, deps: &[u32]) -> ModFile {
        ModFile {
            download_url: format!("https://edge.forgecdn.net/files/1/2/{name}"),
            game_versions: versions.iter().map(ToString::to_string).collect(),
            uploaded: Utc.timestamp_opt(uploaded, 0).unwrap(),
            dependencies: deps
                .iter()
                .map(|id| FileDependency {
                    addon_id: *id,
                    kind: DependencyKind::Required,
                })
                .collect(),
        }
    }

    #[test]
    fn absent_file_is_a_noop() {
        // no expectations set, so any call panics
        let repo = MockModRepository::new();
        let res = install_file(&repo, None, "1.20.1", "mods").unwrap();
        assert!(res.is_empty());
    }

    #[test]
    fn dependency_installs_before_parent() {
        let a = file("a.jar", &["1.20.1"], 10, &[100]);
        let b_old = file("b-old.jar", &["1.20.1"], 1, &[]);
        let b_new = file("b.jar", &["1.20.1"], 2, &[]);

        let mut repo = MockModRepository::new();
        let mut seq = Sequence::new();
        let group = vec![b_old, b_new];
        repo.expect_dependency_groups()
            .withf(|f| f.file_name() == "a.jar")
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(vec![group.clone()]));
        repo.expect_dependency_groups()
            .withf(|f| f.file_name() == "b.jar")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        repo.expect_download_to()
            .withf(|url, dest| url.ends_with("/b.jar") && dest.ends_with("b.jar"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(1));
        repo.expect_download_to()
            .withf(|url, dest| url.ends_with("/a.jar") && dest.ends_with("a.jar"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(1));

        let res = install_file(&repo, Some(&a), "1.20.1", "mods").unwrap();
        assert_eq!(res, vec!["b.jar".to_string(), "a.jar".to_string()]);
    }

    #[test]
    fn latest_compatible_candidate_wins() {
        // newest build first in the group, and an even newer one that doesn't
        // support the target version
        let a = file("a.jar", &["1.20.1"], 10, &[100]);
        let b_wrong_version = file("b-for-1.21.jar", &["1.21"], 9, &[]);
        let b_new = file("b-new.jar", &["1.20.1"], 5, &[]);
        let b_old = file("b-old.jar", &["1.20.1", "1.19.2"], 3, &[]);

        let mut repo = MockModRepository::new();
        let group = vec![b_new, b_wrong_version, b_old];
        repo.expect_dependency_groups()
            .withf(|f| f.file_name() == "a.jar")
            .times(1)
            .returning(move |_| Ok(vec![group.clone()]));
        repo.expect_dependency_groups()
            .withf(|f| f.file_name() == "b-new.jar")
            .times(1)
            .returning(|_| Ok(vec![]));
        repo.expect_download_to()
            .withf(|url, _| url.ends_with("/b-new.jar") || url.ends_with("/a.jar"))
            .times(2)
            .returning(|_, _| Ok(1));

        let res = install_file(&repo, Some(&a), "1.20.1", "mods").unwrap();
        assert_eq!(res, vec!["b-new.jar".to_string(), "a.jar".to_string()]);
    }

    #[test]
    fn group_with_no_compatible_candidate_is_skipped() {
        let a = file("a.jar", &["1.20.1"], 10, &[100]);
        let c = file("c.jar", &["1.19.2"], 5, &[]);

        let mut repo = MockModRepository::new();
        repo.expect_dependency_groups()
            .times(1)
            .returning(move |_| Ok(vec![vec![c.clone()]]));
        repo.expect_download_to()
            .withf(|url, _| url.ends_with("/a.jar"))
            .times(1)
            .returning(|_, _| Ok(1));

        let res = install_file(&repo, Some(&a), "1.20.1", "mods").unwrap();
        assert_eq!(res, vec!["a.jar".to_string()]);
    }

    #[test]
    #[traced_test]
    fn failed_dependency_branch_spares_siblings_and_parent() {
        let a = file("a.jar", &["1.20.1"], 10, &[100, 200]);
        let b = file("b.jar", &["1.20.1"], 5, &[]);
        let c = file("c.jar", &["1.20.1"], 5, &[]);

        let mut repo = MockModRepository::new();
        let (group_b, group_c) = (vec![b], vec![c]);
        repo.expect_dependency_groups()
            .withf(|f| f.file_name() == "a.jar")
            .times(1)
            .returning(move |_| Ok(vec![group_b.clone(), group_c.clone()]));
        repo.expect_dependency_groups()
            .withf(|f| f.file_name() != "a.jar")
            .times(2)
            .returning(|_| Ok(vec![]));
        repo.expect_download_to()
            .withf(|url, _| url.ends_with("/b.jar"))
            .times(1)
            .returning(|url, _| {
                Err(ModgetError::download(
                    url,
                    ModgetError::MiscError("boom".into()),
                ))
            });
        repo.expect_download_to()
            .withf(|url, _| !url.ends_with("/b.jar"))
            .times(2)
            .returning(|_, _| Ok(1));

        let res = install_file(&repo, Some(&a), "1.20.1", "mods").unwrap();
        assert_eq!(res, vec!["c.jar".to_string(), "a.jar".to_string()]);
        assert!(logs_contain("Skipping dependency of a.jar"));
    }

    #[test]
    #[traced_test]
    fn fetch_failure_still_installs_the_file_itself() {
        let a = file("a.jar", &["1.20.1"], 10, &[100]);

        let mut repo = MockModRepository::new();
        repo.expect_dependency_groups()
            .times(1)
            .returning(|_| Err(ModgetError::MiscError("api down".into())));
        repo.expect_download_to()
            .withf(|url, _| url.ends_with("/a.jar"))
            .times(1)
            .returning(|_, _| Ok(1));

        let res = install_file(&repo, Some(&a), "1.20.1", "mods").unwrap();
        assert_eq!(res, vec!["a.jar".to_string()]);
        assert!(logs_contain("Error resolving dependencies of a.jar"));
    }

    #[test]
    fn own_download_failure_propagates() {
        let a = file("a.jar", &["1.20.1"], 10, &[]);

        let mut repo = MockModRepository::new();
        repo.expect_dependency_groups()
            .times(1)
            .returning(|_| Ok(vec![]));
        repo.expect_download_to().times(1).returning(|url, _| {
            Err(ModgetError::download(
                url,
                ModgetError::MiscError("boom".into()),
            ))
        });

        let res = install_file(&repo, Some(&a), "1.20.1", "mods");
        match res {
            Err(ModgetError::DownloadError { url, .. }) => {
                assert!(url.ends_with("/a.jar"));
            }
            other => panic!("expected DownloadError, got {other:?}"),
        }
    }

    #[test]
    fn reinstalling_overwrites_the_existing_file() {
        let a = file("a.jar", &["1.20.1"], 10, &[]);
        let dir = tempfile::tempdir().unwrap();

        let mut repo = MockModRepository::new();
        repo.expect_dependency_groups()
            .times(2)
            .returning(|_| Ok(vec![]));
        let mut calls = 0;
        repo.expect_download_to().times(2).returning(move |_, dest| {
            calls += 1;
            let body: &[u8] = if calls == 1 { b"first" } else { b"second" };
            fs::write(dest, body).unwrap();
            Ok(body.len() as u64)
        });

        install_file(&repo, Some(&a), "1.20.1", dir.path()).unwrap();
        install_file(&repo, Some(&a), "1.20.1", dir.path()).unwrap();

        let entries: Vec<_> = dir.path().read_dir().unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read(dir.path().join("a.jar")).unwrap(), b"second");
    }
}

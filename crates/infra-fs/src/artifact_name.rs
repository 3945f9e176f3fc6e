// Artifact file naming: logs-<date>-<job id>-<uuid>.log

use cinema_core::domain::{JobId, SelectionKey};

const ARTIFACT_PREFIX: &str = "logs-";
const ARTIFACT_EXTENSION: &str = ".log";
const UUID_SIMPLE_LEN: usize = 32;

/// File name for a new artifact; unique even across processes sharing a directory
pub fn artifact_file_name(key: &SelectionKey, job_id: JobId) -> String {
    format!(
        "{}{}-{}-{}{}",
        ARTIFACT_PREFIX,
        key.token(),
        job_id,
        uuid::Uuid::new_v4().simple(),
        ARTIFACT_EXTENSION
    )
}

/// Whether a directory entry is an artifact this crate wrote (and may delete)
///
/// Every part of the name is checked, so look-alikes such as `logs-2025.log`
/// are left alone.
pub fn is_artifact_file_name(name: &str) -> bool {
    let Some(stem) = name
        .strip_prefix(ARTIFACT_PREFIX)
        .and_then(|rest| rest.strip_suffix(ARTIFACT_EXTENSION))
    else {
        return false;
    };
    // <date>-<job id>-<uuid>; the date itself contains dashes
    let mut parts = stem.rsplitn(3, '-');
    let (Some(uuid), Some(job_id), Some(date)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    uuid.len() == UUID_SIMPLE_LEN
        && uuid.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && job_id.bytes().all(|b| b.is_ascii_digit())
        && job_id.parse::<JobId>().is_ok()
        && SelectionKey::parse(date).is_ok_and(|key| key.token() == date)
}

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rollcall_ledger::{AttendanceEntry, IdentityRecord, Ledger, LedgerError, Status};
use rollcall_source::{
    Authenticator, EmbeddingSource, ExtractError, FetchError, FileSource, Region, Role,
    TokenStatus,
};
use rollcall_vecmath::Embedding;
use rollcall_verify::{Engine, EngineConfig, ProbeOutcome, Sample, Session, VerifyError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::outcome::RecognizedStudent;
use crate::{
    AbsenceReport, AttendanceReport, Clock, ComparisonReport, IdentitySummary, LocalClock,
    Outcome, Registered, Roster, ServiceError, SessionReport,
};

/// Engine settings per modality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Mode B identification of captured faces.
    pub faces: EngineConfig,

    /// Mode A verification of handwritten pages.
    pub handwriting: EngineConfig,
}

/// External collaborators of a [`Service`].
pub struct Collaborators {
    pub faces: Box<dyn EmbeddingSource>,
    pub handwriting: Box<dyn EmbeddingSource>,
    pub files: Box<dyn FileSource>,
    pub auth: Box<dyn Authenticator>,
}

/// Registration, attendance capture and handwriting verification.
///
/// Safe to share across threads; all mutable state lives in the [`Ledger`].
pub struct Service {
    faces: Engine,
    handwriting: Engine,
    ledger: Arc<Ledger>,
    collab: Collaborators,
    clock: Box<dyn Clock>,
}

impl Service {
    pub fn new(
        cfg: ServiceConfig,
        ledger: Arc<Ledger>,
        collab: Collaborators,
    ) -> Result<Self, VerifyError> {
        Ok(Self {
            faces: Engine::new(cfg.faces)?,
            handwriting: Engine::new(cfg.handwriting)?,
            ledger,
            collab,
            clock: Box::new(LocalClock),
        })
    }

    /// Replaces the wall clock used to date ledger entries.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Registers an identity from an image containing exactly one face.
    pub fn register(
        &self,
        token: &str,
        id: &str,
        display_name: &str,
        image: &[u8],
    ) -> Outcome<Registered> {
        self.guarded("register", token, || {
            // Reject bad ids before paying for extraction.
            if id.is_empty() || !id.chars().all(char::is_alphanumeric) {
                return Err(LedgerError::InvalidId(id.to_string()).into());
            }
            let embedding = self.collab.faces.extract_one(image)?;
            let dim = embedding.dim();
            self.ledger.register_identity(id, display_name, embedding)?;
            Ok(Registered {
                id: id.to_string(),
                display_name: display_name.to_string(),
                dim,
            })
        })
    }

    /// Identifies every face in `image` and marks recognized identities
    /// present for today's session of `context_label`.
    pub fn take_attendance(
        &self,
        token: &str,
        context_label: &str,
        image: &[u8],
    ) -> Outcome<AttendanceReport> {
        self.take_attendance_frames(token, context_label, &[image])
    }

    /// Like [`Service::take_attendance`] over several frames of one capture.
    /// An identity is accepted at most once across all frames.
    pub fn take_attendance_frames(
        &self,
        token: &str,
        context_label: &str,
        frames: &[&[u8]],
    ) -> Outcome<AttendanceReport> {
        self.guarded("take_attendance", token, || {
            self.capture(context_label, frames)
        })
    }

    /// Marks every registered identity without an entry for today's session
    /// of `context_label` as absent.
    pub fn complete_session(&self, token: &str, context_label: &str) -> Outcome<AbsenceReport> {
        self.guarded("complete_session", token, || {
            let now = self.clock.now();
            let date = now.date();
            let present: HashSet<String> = self
                .ledger
                .attendance_on(date, context_label)?
                .into_iter()
                .filter(|e| e.status == Status::Present)
                .map(|e| e.identity_id)
                .collect();
            let absent =
                self.ledger
                    .complete_session(context_label, date, now.time(), &present)?;
            Ok(AbsenceReport {
                context_label: context_label.to_string(),
                date,
                absent_count: absent.len(),
                absent,
            })
        })
    }

    /// Compares the latest submitted document of `identity_id` against their
    /// handwriting reference, page by page.
    pub fn compare_handwriting(&self, token: &str, identity_id: &str) -> Outcome<ComparisonReport> {
        self.guarded("compare_handwriting", token, || {
            let reference = self
                .collab
                .files
                .fetch(identity_id, Role::Reference)
                .map_err(|e| match e {
                    FetchError::NotFound { .. } => ServiceError::NoReference(identity_id.into()),
                    e => e.into(),
                })?;
            let reference = first_usable(self.collab.handwriting.extract(&reference)?)?;

            let document = self
                .collab
                .files
                .fetch(identity_id, Role::Probe)
                .map_err(|e| match e {
                    FetchError::NotFound { .. } => ServiceError::NoAssignment(identity_id.into()),
                    e => e.into(),
                })?;
            let pages: Vec<Sample> = self
                .collab
                .handwriting
                .extract(&document)?
                .into_iter()
                .map(|region| match region {
                    Region::Embedded(e) => Sample::Embedded(e),
                    Region::Failed { reason } => Sample::Unreadable { reason },
                })
                .collect();

            let verdict = self.handwriting.verify(&reference, &pages)?;
            info!(
                id = identity_id,
                similarity = verdict.aggregate_score,
                matched = verdict.matched,
                pages = pages.len(),
                "handwriting compared"
            );
            Ok(ComparisonReport {
                identity_id: identity_id.to_string(),
                similarity: verdict.aggregate_score,
                similarities: verdict.per_sample_scores,
                matched: verdict.matched,
                failed_pages: verdict.failed_samples,
                unreadable_pages: verdict.unreadable_samples,
            })
        })
    }

    /// Entries recorded for one session.
    pub fn report(
        &self,
        token: &str,
        date: NaiveDate,
        context_label: &str,
    ) -> Outcome<SessionReport> {
        self.guarded("report", token, || {
            let entries = self.ledger.attendance_on(date, context_label)?;
            let present = entries
                .iter()
                .filter(|e| e.status == Status::Present)
                .count();
            Ok(SessionReport {
                context_label: context_label.to_string(),
                date,
                present,
                absent: entries.len() - present,
                entries,
            })
        })
    }

    /// The registered identities, ordered by id.
    pub fn identities(&self, token: &str) -> Outcome<Roster> {
        self.guarded("identities", token, || {
            let identities: Vec<IdentitySummary> = self
                .ledger
                .identities()
                .iter()
                .map(|rec| IdentitySummary {
                    id: rec.id.clone(),
                    display_name: rec.display_name.clone(),
                    dim: rec.embedding.dim(),
                })
                .collect();
            Ok(Roster {
                count: identities.len(),
                identities,
            })
        })
    }

    fn capture(
        &self,
        context_label: &str,
        frames: &[&[u8]],
    ) -> Result<AttendanceReport, ServiceError> {
        if context_label.is_empty() {
            return Err(LedgerError::EmptyContext.into());
        }

        let now = self.clock.now();
        let catalog = self.ledger.identities();
        let mut session = Session::new();
        let mut report = AttendanceReport::new(context_label, now.date());

        for (n, frame) in frames.iter().enumerate() {
            let regions = match self.collab.faces.extract(frame) {
                Ok(regions) => regions,
                Err(e) => {
                    warn!(frame = n + 1, error = %e, "frame skipped");
                    report.notices.push(format!("frame {}: {e}", n + 1));
                    continue;
                }
            };
            if regions.is_empty() {
                report.notices.push(format!(
                    "frame {}: {}",
                    n + 1,
                    ExtractError::NoFaceDetected
                ));
            }

            for region in regions {
                report.probes += 1;
                let probe = match region {
                    Region::Embedded(e) => e,
                    Region::Failed { reason } => {
                        debug!(frame = n + 1, reason = %reason, "region not embedded");
                        report.unidentified += 1;
                        continue;
                    }
                };
                self.resolve_probe(&probe, &catalog, &mut session, &mut report, now)?;
            }
        }

        info!(
            context = context_label,
            date = %report.date,
            probes = report.probes,
            marked = report.marked_count,
            duplicates = report.duplicates.len(),
            unidentified = report.unidentified,
            "attendance captured"
        );
        Ok(report)
    }

    fn resolve_probe(
        &self,
        probe: &Embedding,
        catalog: &[Arc<IdentityRecord>],
        session: &mut Session,
        report: &mut AttendanceReport,
        now: chrono::NaiveDateTime,
    ) -> Result<(), ServiceError> {
        let identification = match self.faces.identify(
            probe,
            catalog.iter().map(|r| (r.id.as_str(), &r.embedding)),
        ) {
            Ok(i) => i,
            Err(e) => {
                warn!(error = %e, "probe rejected");
                report.unidentified += 1;
                return Ok(());
            }
        };

        match session.resolve(identification) {
            ProbeOutcome::Recognized(m) => {
                let display_name = catalog
                    .binary_search_by(|r| r.id.as_str().cmp(&m.id))
                    .map(|i| catalog[i].display_name.clone())
                    .unwrap_or_default();
                let entry = AttendanceEntry {
                    identity_id: m.id.clone(),
                    display_name: display_name.clone(),
                    date: now.date(),
                    time: now.time(),
                    context_label: report.context_label.clone(),
                    status: Status::Present,
                };
                if self.ledger.record_attendance(&entry)? {
                    report.marked_count += 1;
                } else {
                    report.already_marked.push(m.id.clone());
                }
                report.recognized_students.push(RecognizedStudent {
                    id: m.id,
                    display_name,
                    score: m.score,
                });
            }
            ProbeOutcome::Duplicate(m) => report.duplicates.push(m),
            ProbeOutcome::Unidentified { best_score } => {
                debug!(?best_score, "probe unidentified");
                report.unidentified += 1;
            }
        }
        Ok(())
    }

    fn authorize(&self, token: &str) -> Result<(), ServiceError> {
        match self.collab.auth.validate(token) {
            TokenStatus::Valid => Ok(()),
            status => Err(ServiceError::Unauthorized(status)),
        }
    }

    fn guarded<T>(
        &self,
        op: &'static str,
        token: &str,
        f: impl FnOnce() -> Result<T, ServiceError>,
    ) -> Outcome<T> {
        let result = self.authorize(token).and_then(|()| f());
        if let Err(e) = &result {
            warn!(op, kind = e.kind(), error = %e, "operation failed");
        }
        result.into()
    }
}

fn first_usable(regions: Vec<Region>) -> Result<Embedding, ExtractError> {
    if regions.is_empty() {
        return Err(ExtractError::ExtractionFailed(
            "reference contains no sample".into(),
        ));
    }
    regions
        .into_iter()
        .find_map(|r| match r {
            Region::Embedded(e) => Some(e),
            Region::Failed { .. } => None,
        })
        .ok_or_else(|| ExtractError::ExtractionFailed("reference is unreadable".into()))
}

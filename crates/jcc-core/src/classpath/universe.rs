//! Assembly of the base and candidate universes.
//!
//! Each side sees its own artifact, the shared libraries, and the libraries
//! only that side depends on.  Libraries are inserted before the artifact so
//! that the artifact's own definitions win.

use std::time::Instant;

use tracing::debug;

use crate::classpath::index::ClasspathIndex;
use crate::models::{ClassModel, Origin};

/// Which side of the comparison a universe belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Base,
    Candidate,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Base => "base",
            Side::Candidate => "candidate",
        }
    }
}

/// Raw inputs for both universes of one run.
#[derive(Clone, Debug, Default)]
pub struct UniverseInputs {
    pub base_artifact: Vec<ClassModel>,
    pub candidate_artifact: Vec<ClassModel>,
    pub shared_libraries: Vec<ClassModel>,
    pub base_libraries: Vec<ClassModel>,
    pub candidate_libraries: Vec<ClassModel>,
}

fn tagged(models: &[ClassModel], origin: Origin) -> impl Iterator<Item = ClassModel> + '_ {
    models.iter().cloned().map(move |mut model| {
        model.origin = origin;
        model
    })
}

/// Build the index for one side.  Origins are (re)assigned from the slot each
/// model was supplied in.
pub fn assemble(
    side: Side,
    artifact: &[ClassModel],
    shared: &[ClassModel],
    side_only: &[ClassModel],
) -> ClasspathIndex {
    let started = Instant::now();
    let models = tagged(shared, Origin::SharedLibrary)
        .chain(tagged(side_only, Origin::SideOnlyLibrary))
        .chain(tagged(artifact, Origin::PrimaryArtifact));
    let index = ClasspathIndex::build(side.as_str(), models);
    debug!(
        "Built {} universe: {} classes ({} artifact, {} shared, {} side-only) in {}ms",
        side.as_str(),
        index.len(),
        artifact.len(),
        shared.len(),
        side_only.len(),
        started.elapsed().as_millis()
    );
    index
}

impl UniverseInputs {
    pub fn base_universe(&self) -> ClasspathIndex {
        assemble(
            Side::Base,
            &self.base_artifact,
            &self.shared_libraries,
            &self.base_libraries,
        )
    }

    pub fn candidate_universe(&self) -> ClasspathIndex {
        assemble(
            Side::Candidate,
            &self.candidate_artifact,
            &self.shared_libraries,
            &self.candidate_libraries,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

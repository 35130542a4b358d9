use pulse_core::{FieldShape, PublicationStub};

use crate::identifiers::doi::Doi;

/// Pull a DOI out of a profile stub.
///
/// The explicit `external_ids` entry wins. Otherwise the link/source fields
/// are scanned in their fixed order and the first DOI-looking string is
/// returned. See [`FieldShape::find_link_text`] for the layouts read.
pub fn extract_doi(stub: &PublicationStub) -> Option<Doi> {
    if let Some(explicit) = stub.explicit_doi()
        && let Some(doi) = Doi::parse(explicit).ok().or_else(|| Doi::find_in(explicit))
    {
        return Some(doi);
    }

    stub.identifier_fields
        .iter()
        .find_map(|(_, shape)| find_doi_in_shape(shape))
}

pub fn find_doi_in_shape(shape: &FieldShape) -> Option<Doi> {
    shape.find_link_text(Doi::find_in)
}

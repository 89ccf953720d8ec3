use ::serde::{de::DeserializeOwned, ser::SerializeStruct, Deserialize, Serialize};

use crate::dfm::{Dfm, DfmMeta};
use crate::error::{DfmError, DfmResult};
use crate::utils::label::LabelIndex;
use crate::utils::sparse::{self, DfmValue};

/// Plain form of a `Dfm` for deserialization.
/// Cells are stored as `(document, feature, value)` triplets in row order.
/// Convert with `into_dfm`, which validates the labels and the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfmData<N = f64> {
    pub docnames: Vec<String>,
    pub featnames: Vec<String>,
    pub shape: (usize, usize),
    pub triplets: Vec<(usize, usize, N)>,
    #[serde(default)]
    pub meta: DfmMeta,
}

impl<N> DfmData<N>
where
    N: DfmValue,
{
    /// Rebuild the dfm.
    ///
    /// Document labels must be unique. Feature labels may repeat, as they
    /// can in column-combine output.
    pub fn into_dfm(self) -> DfmResult<Dfm<N>> {
        let docnames = LabelIndex::build(self.docnames, "document")?;
        let featnames = LabelIndex::from_merged(self.featnames);
        if self.shape != (docnames.len(), featnames.len()) {
            return Err(DfmError::shape(format!(
                "declared shape {:?} against {} documents x {} features",
                self.shape,
                docnames.len(),
                featnames.len()
            )));
        }
        let matrix = sparse::from_triplets(self.shape, self.triplets)?;
        Ok(Dfm::from_parts(docnames, featnames, matrix, self.meta))
    }
}

impl<N> Dfm<N>
where
    N: DfmValue,
{
    pub fn to_data(&self) -> DfmData<N> {
        DfmData {
            docnames: self.docnames().to_vec(),
            featnames: self.featnames().to_vec(),
            shape: (self.ndoc(), self.nfeat()),
            triplets: triplets(self),
            meta: self.meta().clone(),
        }
    }

    pub fn to_cbor(&self) -> DfmResult<Vec<u8>>
    where
        N: Serialize,
    {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> DfmResult<Self>
    where
        N: DeserializeOwned,
    {
        let data: DfmData<N> = serde_cbor::from_slice(bytes)?;
        data.into_dfm()
    }
}

fn triplets<N>(dfm: &Dfm<N>) -> Vec<(usize, usize, N)>
where
    N: DfmValue,
{
    (0..dfm.ndoc())
        .flat_map(|r| dfm.row_entries(r).into_iter().map(move |(c, v)| (r, c, v)))
        .collect()
}

impl<N> Serialize for Dfm<N>
where
    N: DfmValue + Serialize,
{
    /// Same layout as `DfmData`; deserialize through it.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Dfm", 5)?;
        state.serialize_field("docnames", self.docnames())?;
        state.serialize_field("featnames", self.featnames())?;
        state.serialize_field("shape", &(self.ndoc(), self.nfeat()))?;
        state.serialize_field("triplets", &triplets(self))?;
        state.serialize_field("meta", self.meta())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dfm {
        Dfm::from_dense(
            ["d1", "d2"],
            ["cat", "dog", "fox"],
            vec![vec![1.0, 0.0, 2.5], vec![0.0, 3.0, 0.0]],
        )
        .unwrap()
        .with_meta(DfmMeta {
            weighting: "prop".to_string(),
            ngrams: vec![1, 2],
            ..DfmMeta::default()
        })
    }

    #[test]
    fn data_lists_stored_cells_in_row_order() {
        let data = sample().to_data();
        assert_eq!(data.shape, (2, 3));
        assert_eq!(data.triplets, vec![(0, 0, 1.0), (0, 2, 2.5), (1, 1, 3.0)]);
    }

    #[test]
    fn cbor_keeps_values_and_meta() {
        let x = sample();
        let bytes = x.to_cbor().unwrap();
        let back: Dfm = Dfm::from_cbor(&bytes).unwrap();
        assert_eq!(back, x);
        assert_eq!(back.meta(), x.meta());
    }

    #[test]
    fn json_matches_data_layout() {
        let x = sample();
        let json = serde_json::to_string(&x).unwrap();
        let data: DfmData = serde_json::from_str(&json).unwrap();
        assert_eq!(data, x.to_data());
    }

    #[test]
    fn into_dfm_validates() {
        let mut data = sample().to_data();
        data.shape = (3, 3);
        assert!(matches!(data.into_dfm(), Err(DfmError::Shape { .. })));

        let mut data = sample().to_data();
        data.docnames = vec!["d1".to_string(), "d1".to_string()];
        assert!(matches!(
            data.into_dfm(),
            Err(DfmError::DuplicateLabel { kind: "document", .. })
        ));

        let mut data = sample().to_data();
        data.triplets.push((0, 7, 1.0));
        assert!(matches!(data.into_dfm(), Err(DfmError::Shape { .. })));
    }

    #[test]
    fn repeated_features_survive() {
        let mut data = sample().to_data();
        data.featnames[2] = "cat".to_string();
        let x = data.into_dfm().unwrap();
        assert_eq!(x.featnames()[2], "cat");
        assert_eq!(x.value_at(0, 2), 2.5);
    }

    #[test]
    fn garbage_bytes_are_codec_errors() {
        let res: DfmResult<Dfm> = Dfm::from_cbor(&[0xff, 0x00, 0x13]);
        assert!(matches!(res, Err(DfmError::Codec { .. })));
    }
}

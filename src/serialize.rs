use rulinalg::matrix::Matrix;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize_matrix<S: Serializer>(
    matrix: &Matrix<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    // u64 bits keep every f64 exact across a round trip
    let bits: Vec<u64> = matrix.data().iter().map(|&f| f64::to_bits(f)).collect();

    bits.serialize(serializer)
}

pub fn deserialize_matrix_flat<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Matrix<f64>, D::Error> {
    Vec::<u64>::deserialize(deserializer).map(|v| {
        let float_data: Vec<f64> = v.into_iter().map(f64::from_bits).collect();

        Matrix::new(1, float_data.len(), float_data)
    })
}

pub fn deserialize_matrix_square<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Matrix<f64>, D::Error> {
    let float_data: Vec<f64> = Vec::<u64>::deserialize(deserializer)?
        .into_iter()
        .map(f64::from_bits)
        .collect();

    let n = (float_data.len() as f64).sqrt() as usize;
    if n * n != float_data.len() {
        return Err(D::Error::custom(format!(
            "non-square weight vec of length {}",
            float_data.len()
        )));
    }
    Ok(Matrix::new(n, n, float_data))
}

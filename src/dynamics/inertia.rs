//! Joint-space inertia matrix and bias force vector by the unit-vector
//! method.
//!
//! One inverse-dynamics pass at zero joint acceleration yields the bias
//! vector h(q, q̇); one further pass per degree of freedom with a unit
//! acceleration on that coordinate yields the matching column of H(q).
//! O(n) passes of an O(n) algorithm — acceptable for chains of modest
//! size, and exactly consistent with the Newton–Euler kernel it reuses.

use nalgebra::{DMatrix, DVector};

use crate::config::JOINT_STATE_SLOTS;
use crate::core::chain::Chain;
use crate::core::error::{ChainError, Result};

impl Chain {
    /// Computes the joint-space inertia matrix H(q) and bias force vector
    /// h(q, q̇) for the current displacement and velocity. `inertia` must
    /// be n×n and `bias` of length n where n is the chain's joint size;
    /// a sizing violation is reported before either output is touched.
    /// Joint accelerations are zeroed on return.
    pub fn inertia_mat_bias_vec(
        &mut self,
        inertia: &mut DMatrix<f64>,
        bias: &mut DVector<f64>,
    ) -> Result<()> {
        let n = self.joint_size();
        if !inertia.is_square() || inertia.nrows() != bias.len() || bias.len() != n {
            return Err(ChainError::SizeMismatch {
                expected: n,
                actual: bias.len(),
            });
        }
        // Bias force vector at zero joint acceleration.
        self.zero_joint_acc_all();
        self.update_id();
        bias.copy_from_slice(&self.get_joint_trq_all());
        // One column per degree of freedom.
        let mut probe = [0.0; JOINT_STATE_SLOTS];
        let mut col = 0;
        for j in 0..self.link_num() {
            for k in 0..self.link(j).joint_size() {
                if col >= n {
                    return Err(ChainError::Fatal(
                        "offset table disagrees with the joint size".to_string(),
                    ));
                }
                probe[k] = 1.0;
                self.link_mut(j).joint.set_acc(&probe);
                self.update_id();
                let trq = self.get_joint_trq_all();
                for r in 0..n {
                    inertia[(r, col)] = trq[r] - bias[r];
                }
                probe[k] = 0.0;
                self.link_mut(j).joint.set_acc(&probe);
                col += 1;
            }
        }
        Ok(())
    }
}

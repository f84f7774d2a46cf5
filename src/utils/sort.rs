use core::mem;

/// Radix sort of a sparse row stored as SoA (column indices / values).
/// - Sorts by column index ascending
/// - Reorders vals accordingly
/// - Stable, so equal indices keep their relative order
///
/// Complexity: 4 passes, each O(n + 256)
#[inline]
pub fn radix_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // Small rows (short lyrics): insertion sort beats allocating scratch.
    if n <= 32 {
        insertion_sort_u32_soa(inds, vals);
        return;
    }

    let mut inds_tmp = vec![0u32; n];
    let mut vals_tmp: Vec<N> = vec![vals[0]; n];

    let mut src_inds: &mut [u32] = inds;
    let mut src_vals: &mut [N] = vals;
    let mut dst_inds: &mut [u32] = &mut inds_tmp;
    let mut dst_vals: &mut [N] = &mut vals_tmp;

    // LSD, one byte per pass
    for shift in [0u32, 8, 16, 24] {
        let mut count = [0usize; 256];

        for &k in src_inds.iter() {
            count[((k >> shift) & 0xFF) as usize] += 1;
        }

        let mut sum = 0usize;
        for c in count.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }

        for idx in 0..n {
            let k = src_inds[idx];
            let b = ((k >> shift) & 0xFF) as usize;
            let pos = count[b];
            count[b] = pos + 1;
            dst_inds[pos] = k;
            dst_vals[pos] = src_vals[idx];
        }

        mem::swap(&mut src_inds, &mut dst_inds);
        mem::swap(&mut src_vals, &mut dst_vals);
    }
    // even pass count: the result already sits in the caller's slices
}

#[inline]
fn insertion_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    let n = inds.len();
    for i in 1..n {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

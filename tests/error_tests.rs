use stridebuf::{StrideBuf, StrideBufError, StrideIter};

#[test]
fn test_error_messages() {
    assert_eq!(
        StrideBufError::AllocationFailure {
            requested_bytes: 64
        }
        .to_string(),
        "Allocation failure: could not obtain 64 bytes"
    );
    assert_eq!(
        StrideBufError::IndexOutOfBounds {
            index: 5,
            length: 3
        }
        .to_string(),
        "Index out of bounds: index 5 is beyond buffer length 3"
    );
    assert_eq!(
        StrideBufError::StrideMismatch {
            expected: 4,
            actual: 2
        }
        .to_string(),
        "Stride mismatch: expected 4 bytes per element, got 2"
    );
    assert_eq!(
        StrideBufError::NotEnumerated.to_string(),
        "Iterator is not enumerated"
    );
}

#[test]
fn test_insert_past_end() {
    let mut buf = StrideBuf::from_values(&[1i32]).unwrap();

    assert_eq!(
        buf.insert_value(2, 5i32),
        Err(StrideBufError::IndexOutOfBounds {
            index: 2,
            length: 1
        })
    );
    assert_eq!(buf.len(), 1);
}

#[test]
fn test_wrong_width_is_rejected() {
    let mut buf = StrideBuf::new(4);

    assert_eq!(
        buf.push(&[1, 2]),
        Err(StrideBufError::StrideMismatch {
            expected: 4,
            actual: 2
        })
    );
    assert!(buf.push_value(1u64).is_err());
    assert_eq!(buf.len(), 0);
    // nothing was allocated for the rejected values
    assert_eq!(buf.capacity(), 0);

    buf.push_value(1i32).unwrap();
    assert!(buf.set_checked(0, &[0; 8]).is_err());
    assert_eq!(buf.get_value::<i32>(0), Some(1));
}

#[test]
fn test_set_checked_out_of_bounds() {
    let mut buf = StrideBuf::new(2);

    assert_eq!(
        buf.set_checked(0, &[1, 2]),
        Err(StrideBufError::IndexOutOfBounds {
            index: 0,
            length: 0
        })
    );
}

#[test]
fn test_capacity_overflow_is_allocation_failure() {
    let mut buf = StrideBuf::new(16);

    assert_eq!(
        buf.grow(usize::MAX / 2),
        Err(StrideBufError::AllocationFailure {
            requested_bytes: usize::MAX
        })
    );
    assert_eq!(buf.capacity(), 0);
    assert!(StrideBuf::with_capacity(8, usize::MAX).is_err());
}

#[test]
fn test_collect_rejects_mismatched_generator_element() {
    // the generator claims stride 4 but yields 2-byte elements
    let liar = StrideIter::from_fn(4, {
        let mut done = false;
        move || {
            if done {
                return None;
            }
            done = true;
            Some(stridebuf::Element::from_value(7u16))
        }
    });

    let mut target = StrideBuf::new(4);
    assert_eq!(
        liar.collect_into(&mut target),
        Err(StrideBufError::StrideMismatch {
            expected: 4,
            actual: 2
        })
    );
    assert!(target.is_empty());
}

#[cfg(feature = "std")]
#[test]
fn test_error_is_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}

    takes_error(&StrideBufError::NotEnumerated);
}

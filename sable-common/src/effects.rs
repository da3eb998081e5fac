bitflags::bitflags! {
    /// Observable effects of executing an instruction, beyond producing its value.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct SideEffects: u32{
        const FIELD_READ = 0x1;
        const FIELD_WRITE = 0x2;
        const ALLOCATION = 0x4;
        /// Arbitrary reads and writes of a call.
        const CALL = 0x8;
    }
}
impl SideEffects {
    pub fn does_any_write(self) -> bool {
        self.intersects(SideEffects::FIELD_WRITE | SideEffects::CALL)
    }
}

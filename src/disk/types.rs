/// 每个逻辑块（Block）的大小：256 字节
/// 文件系统以“块”为最小读写单位。
pub const BLOCK_SIZE: usize = 256;

/// 默认虚拟磁盘包含的块总数
pub const BLOCK_COUNT: u64 = 128;

/// 默认虚拟磁盘总大小（单位：字节）
/// 用于创建固定大小的 disk.img 文件。
pub const DISK_SIZE: u64 = BLOCK_SIZE as u64 * BLOCK_COUNT;

/// 块编号
pub type BlockReference = u16;

/// “没有块” 的哨兵值
pub const UNALLOCATED_BLOCK: BlockReference = BlockReference::MAX;

/// 每个块开头的 next_block 字段长度（空闲链表使用）
pub const BLOCK_HEADER_SIZE: usize = 2;

/// 定义一个逻辑块类型
/// 所有磁盘读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];

/// 一个新的块：内容清零，next_block 为哨兵
pub fn empty_block() -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    set_next_block(&mut block, UNALLOCATED_BLOCK);
    block
}

pub fn next_block(block: &Block) -> BlockReference {
    BlockReference::from_le_bytes([block[0], block[1]])
}

pub fn set_next_block(block: &mut Block, next: BlockReference) {
    block[..BLOCK_HEADER_SIZE].copy_from_slice(&next.to_le_bytes());
}

/// 块头之后的有效载荷
pub fn payload(block: &Block) -> &[u8] {
    &block[BLOCK_HEADER_SIZE..]
}

pub fn payload_mut(block: &mut Block) -> &mut [u8] {
    &mut block[BLOCK_HEADER_SIZE..]
}

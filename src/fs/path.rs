use log::debug;

use crate::{
    disk::BlockDevice,
    fs::{
        config::{InodeReference, PATH_SEPARATOR, ROOT_INODE},
        error::{FileSystemError, Result},
        FileSystem,
    },
};

/// 路径解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// 最后一个分量所在的目录
    pub parent: InodeReference,
    /// 最后一个分量对应的 inode；不存在为 None，是否算错误由调用方决定
    pub child: Option<InodeReference>,
    /// 最后一个分量的名字
    pub name: String,
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|c| !c.is_empty())
}

impl<D: BlockDevice> FileSystem<D> {
    /// 在 `cwd` 下解析 `path`。绝对路径从根目录开始，相对路径从 `cwd` 开始。
    pub fn find(&self, cwd: &str, path: &str) -> Result<Lookup> {
        let start = if path.starts_with(PATH_SEPARATOR) {
            ROOT_INODE
        } else {
            self.resolve_directory(cwd)?
        };
        self.find_from(start, path)
    }

    /// 把一个绝对路径解析成目录 inode
    pub fn resolve_directory(&self, path: &str) -> Result<InodeReference> {
        if !path.starts_with(PATH_SEPARATOR) {
            return Err(FileSystemError::InvalidPath(path.to_string()));
        }
        let lookup = self.find_from(ROOT_INODE, path)?;
        let inode = lookup
            .child
            .ok_or_else(|| FileSystemError::NotFound(path.to_string()))?;
        if !self.read_inode(inode)?.is_directory() {
            return Err(FileSystemError::NotADirectory(path.to_string()));
        }
        Ok(inode)
    }

    /// 从 `start` 目录开始逐个分量查找
    pub fn find_from(&self, start: InodeReference, path: &str) -> Result<Lookup> {
        let parts: Vec<&str> = components(path).collect();
        let Some((last, walk)) = parts.split_last() else {
            // 没有分量：就是起点目录本身
            let parent = self.lookup_entry(start, "..", path)?.unwrap_or(start);
            return Ok(Lookup {
                parent,
                child: Some(start),
                name: ".".to_string(),
            });
        };

        // 已走过的前缀，只用于错误信息
        let absolute = path.starts_with(PATH_SEPARATOR);
        let extend = |walked: &mut String, part: &str| {
            if absolute || !walked.is_empty() {
                walked.push(PATH_SEPARATOR);
            }
            walked.push_str(part);
        };

        let mut current = start;
        let mut walked = String::new();
        for part in walk {
            extend(&mut walked, part);
            current = self
                .lookup_entry(current, part, &walked)?
                .ok_or_else(|| FileSystemError::NotFound(walked.clone()))?;
        }

        extend(&mut walked, last);
        let child = self.lookup_entry(current, last, &walked)?;
        debug!(
            "resolved {:?} from inode {}: parent={} child={:?}",
            path, start, current, child
        );
        Ok(Lookup {
            parent: current,
            child,
            name: last.to_string(),
        })
    }

    /// 在目录 `dir` 中查找 `name`；`dir` 不是目录时报 NotADirectory
    fn lookup_entry(
        &self,
        dir: InodeReference,
        name: &str,
        shown_as: &str,
    ) -> Result<Option<InodeReference>> {
        let inode = self.read_inode(dir)?;
        if !inode.is_directory() {
            let parent_path = shown_as
                .rsplit_once(PATH_SEPARATOR)
                .map(|(head, _)| head)
                .filter(|head| !head.is_empty())
                .unwrap_or(shown_as);
            return Err(FileSystemError::NotADirectory(parent_path.to_string()));
        }
        Ok(self.read_directory(&inode)?.find(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDisk;

    fn tree() -> FileSystem<MemoryDisk> {
        let mut fs = FileSystem::new(MemoryDisk::new(64)).unwrap();
        fs.format().unwrap();
        fs.mkdir("/", "a").unwrap();
        fs.mkdir("/", "a/b").unwrap();
        fs.mkdir("/", "a/c").unwrap();
        fs.touch("/", "a/notes").unwrap();
        fs
    }

    #[test]
    fn root_resolves_to_itself() {
        let fs = tree();
        let lookup = fs.find("/", "/").unwrap();
        assert_eq!(lookup.parent, ROOT_INODE);
        assert_eq!(lookup.child, Some(ROOT_INODE));
        assert_eq!(lookup.name, ".");
    }

    #[test]
    fn dot_dot_from_cwd_matches_absolute() {
        let fs = tree();
        let relative = fs.find("/a/b", "../c").unwrap();
        let absolute = fs.find("/", "/a/c").unwrap();
        assert_eq!(relative.parent, absolute.parent);
        assert_eq!(relative.child, absolute.child);
        assert!(relative.child.is_some());
    }

    #[test]
    fn root_parent_is_root() {
        let fs = tree();
        let lookup = fs.find("/a", "/..").unwrap();
        assert_eq!(lookup.child, Some(ROOT_INODE));
        assert_eq!(lookup.parent, ROOT_INODE);
    }

    #[test]
    fn missing_last_component_is_not_an_error() {
        let fs = tree();
        let a = fs.find("/", "/a").unwrap().child.unwrap();
        let lookup = fs.find("/a", "new").unwrap();
        assert_eq!(lookup.parent, a);
        assert_eq!(lookup.child, None);
        assert_eq!(lookup.name, "new");
    }

    #[test]
    fn missing_middle_component_is_not_found() {
        let fs = tree();
        match fs.find("/", "/a/missing/x") {
            Err(FileSystemError::NotFound(p)) => assert_eq!(p, "/a/missing"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn file_in_the_middle_is_not_a_directory() {
        let fs = tree();
        match fs.find("/", "/a/notes/x") {
            Err(FileSystemError::NotADirectory(p)) => assert_eq!(p, "/a/notes"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn names_are_case_sensitive() {
        let fs = tree();
        assert_eq!(fs.find("/", "/A").unwrap().child, None);
    }

    #[test]
    fn repeated_separators_are_ignored() {
        let fs = tree();
        assert_eq!(
            fs.find("/", "//a///b/").unwrap(),
            fs.find("/", "/a/b").unwrap()
        );
    }

    #[test]
    fn bad_cwd_is_reported() {
        let fs = tree();
        assert!(matches!(
            fs.find("/nowhere", "x"),
            Err(FileSystemError::NotFound(_))
        ));
        assert!(matches!(
            fs.find("/a/notes", "x"),
            Err(FileSystemError::NotADirectory(_))
        ));
    }
}
